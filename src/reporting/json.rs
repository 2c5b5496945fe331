use anyhow::Result;
use serde::Serialize;

use crate::reporting::model::Finding;

#[derive(Serialize)]
struct Report<'a> {
    tool: &'static str,
    version: &'static str,
    target: &'a str,
    total: usize,
    findings: &'a [Finding],
}

pub fn render(target: &str, findings: &[Finding]) -> Result<String> {
    let report = Report {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        target,
        total: findings.len(),
        findings,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
