use unicode_width::UnicodeWidthStr;

use crate::reporting::model::Finding;

const BOX_WIDTH: usize = 72;
const INNER_WIDTH: usize = BOX_WIDTH - 2;

fn top_border() -> String {
    format!("╔{}╗", "═".repeat(INNER_WIDTH))
}

fn middle_border() -> String {
    format!("╠{}╣", "═".repeat(INNER_WIDTH))
}

fn bottom_border() -> String {
    format!("╚{}╝", "═".repeat(INNER_WIDTH))
}

fn box_line(content: &str) -> String {
    let padded = format!(" {} ", content);
    let width = UnicodeWidthStr::width(padded.as_str());
    let padding = INNER_WIDTH.saturating_sub(width);
    format!("║{}{}║", padded, " ".repeat(padding))
}

fn wrapped_lines(label: &str, value: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = format!("{label}: ");
    for word in value.split_whitespace() {
        if UnicodeWidthStr::width(current.as_str()) + UnicodeWidthStr::width(word) + 3
            > INNER_WIDTH
            && !current.trim_end().ends_with(':')
        {
            lines.push(current.trim_end().to_string());
            current = "  ".to_string();
        }
        current.push_str(word);
        current.push(' ');
    }
    lines.push(current.trim_end().to_string());
    lines
}

pub fn render(target: &str, findings: &[Finding]) -> String {
    let mut out = Vec::new();
    out.push(top_border());
    out.push(box_line(&format!("Target: {target}")));

    if findings.is_empty() {
        out.push(middle_border());
        out.push(box_line("No SQL injection detected"));
        out.push(bottom_border());
        return out.join("\n");
    }

    out.push(box_line(&format!("Findings: {}", findings.len())));
    for finding in findings {
        out.push(middle_border());
        out.push(box_line(&finding.name));
        for line in wrapped_lines("Parameter", &finding.parameter) {
            out.push(box_line(&line));
        }
        for line in wrapped_lines("Attack", &finding.attack) {
            out.push(box_line(&line));
        }
        if let Some(ref evidence) = finding.evidence {
            for line in wrapped_lines("Evidence", evidence) {
                out.push(box_line(&line));
            }
        }
        if !finding.other_info.is_empty() {
            for line in wrapped_lines("Info", &finding.other_info) {
                out.push(box_line(&line));
            }
        }
        out.push(box_line(&format!(
            "Confidence: {}  CWE-{}  WASC-{}",
            finding.confidence, finding.cwe, finding.wasc
        )));
    }
    out.push(bottom_border());
    out.join("\n")
}
