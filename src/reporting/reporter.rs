use crate::reporting::model::Finding;

/// Fire-and-forget finding sink. The engine never consults what it raised.
#[derive(Default)]
pub struct Reporter {
    findings: Vec<Finding>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, finding: Finding) {
        tracing::info!(
            name = %finding.name,
            parameter = %finding.parameter,
            attack = %finding.attack,
            "finding raised"
        );
        self.findings.push(finding);
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }
}
