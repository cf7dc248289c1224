//! Plain text comparison table for terminals

use crate::comparison::{ComparisonReport, Distribution, Summary};

fn cell(d: &Distribution) -> String {
    match d.summarize() {
        summary @ Summary::Spread { min, max, n, .. } => {
            format!("{} [{}..{}, n={}]", summary, min, max, n)
        }
        summary => summary.to_string(),
    }
}

/// Render the report as aligned columns, one line per group
pub fn render_text(report: &ComparisonReport) -> String {
    let mut header = vec!["group".to_string()];
    if let Some(first) = report.rows.first() {
        header.extend(first.metrics.iter().map(|m| m.label.to_string()));
    }
    header.push("delta".to_string());
    header.push("P(better)".to_string());

    let mut lines = vec![header];
    for row in &report.rows {
        let mut line = vec![row.name.clone()];
        line.extend(row.metrics.iter().map(|m| cell(&m.distribution)));
        match &row.delta {
            Some(delta) => {
                line.push(cell(&delta.distribution));
                line.push(format!("{:.3}", delta.prob_better));
            }
            None => {
                line.push(String::new());
                line.push(String::new());
            }
        }
        lines.push(line);
    }

    let columns = lines.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            lines
                .iter()
                .filter_map(|l| l.get(c))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for line in &lines {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(text, width)| {
                let pad = width - text.chars().count();
                format!("{}{}", text, " ".repeat(pad))
            })
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    }
    out
}
