use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "Low"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::High => write!(f, "High"),
        }
    }
}

/// One confirmed injection point, as raised by a detection oracle.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub name: String,
    pub uri: String,
    pub parameter: String,
    pub attack: String,
    pub evidence: Option<String>,
    pub other_info: String,
    pub confidence: Confidence,
    pub cwe: u32,
    pub wasc: u32,
}

impl Finding {
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        parameter: impl Into<String>,
        attack: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            parameter: parameter.into(),
            attack: attack.into(),
            evidence: None,
            other_info: String::new(),
            confidence: Confidence::Medium,
            cwe: 89,
            wasc: 19,
        }
    }

    pub fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    pub fn other_info(mut self, other_info: impl Into<String>) -> Self {
        self.other_info = other_info.into();
        self
    }
}
