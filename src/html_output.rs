//! HTML output for run comparison reports
//!
//! The table is a self-contained fragment (rows = seed groups, columns =
//! time/score/delta). `to_html` wraps it in a full page with the run ids and
//! the run attributes.

use crate::comparison::{color_prob, ComparisonReport, Distribution, Summary};
use crate::store::RunAttrs;

/// Escape HTML special characters
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Summary of a distribution; a spread gets its range and count as a tooltip
fn render_distribution(d: &Distribution) -> String {
    match d.summarize() {
        Summary::Spread {
            mean,
            stdev,
            min,
            max,
            n,
        } => format!(
            r#"<span title="{}..{}, {} items">{:.3} &plusmn; <i>{:.3}</i></span>"#,
            min, max, n, mean, stdev
        ),
        summary => summary.to_string(),
    }
}

/// Render the comparison table fragment
pub fn render_table(report: &ComparisonReport) -> String {
    let mut html = String::from("<table>");

    for row in &report.rows {
        html.push_str("<tr>");
        html.push_str(&format!("<td>{}</td>", escape_html(&row.name)));

        for cell in &row.metrics {
            html.push_str(&format!(
                "<td>{} = {}</td>",
                cell.label,
                render_distribution(&cell.distribution)
            ));
        }

        if let Some(delta) = &row.delta {
            html.push_str(&format!(
                r#"<td class="delta" style="color: {}" title="P(better) = {:.3}">delta = {}</td>"#,
                color_prob(delta.prob_better),
                delta.prob_better,
                render_distribution(&delta.distribution)
            ));
        }

        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}

/// Full comparison page
#[derive(Debug)]
pub struct HtmlOutput<'a> {
    run_id: &'a str,
    baseline_id: Option<&'a str>,
    attrs: &'a RunAttrs,
}

impl<'a> HtmlOutput<'a> {
    pub fn new(run_id: &'a str, baseline_id: Option<&'a str>, attrs: &'a RunAttrs) -> Self {
        Self {
            run_id,
            baseline_id,
            attrs,
        }
    }

    /// Generate embedded CSS styles
    fn generate_styles() -> &'static str {
        r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
            background-color: #f5f5f5;
        }
        h1, h2 {
            color: #333;
        }
        table {
            border-collapse: collapse;
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            margin-bottom: 20px;
        }
        td {
            border: 1px solid #ddd;
            padding: 6px 10px;
            font-family: monospace;
        }
        tr:first-child {
            font-weight: bold;
        }
        tr:hover {
            background-color: #f0f0f0;
        }
        .delta {
            font-weight: bold;
        }
        .attrs {
            font-family: monospace;
            font-size: 0.9em;
            white-space: pre;
            color: #555;
        }
        .footer {
            margin-top: 20px;
            font-size: 0.8em;
            color: #888;
            text-align: center;
        }
        "#
    }

    fn render_attrs(&self) -> String {
        let pretty = serde_json::to_string_pretty(self.attrs).unwrap_or_default();
        format!("    <div class=\"attrs\">{}</div>\n", escape_html(&pretty))
    }

    /// Generate complete HTML document
    pub fn to_html(&self, report: &ComparisonReport) -> String {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html lang=\"en\">\n");

        html.push_str("<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(&format!(
            "    <title>Run {}</title>\n",
            escape_html(self.run_id)
        ));
        html.push_str("    <style>");
        html.push_str(Self::generate_styles());
        html.push_str("</style>\n");
        html.push_str("</head>\n");

        html.push_str("<body>\n");
        html.push_str(&format!("    <h1>Run {}</h1>\n", escape_html(self.run_id)));
        match self.baseline_id {
            Some(baseline) => html.push_str(&format!(
                "    <h2>Compared to {}</h2>\n",
                escape_html(baseline)
            )),
            None => html.push_str("    <h2>No baseline</h2>\n"),
        }

        html.push_str("    ");
        html.push_str(&render_table(report));
        html.push('\n');

        html.push_str("    <h2>Attributes</h2>\n");
        html.push_str(&self.render_attrs());

        html.push_str("    <div class=\"footer\">\n");
        html.push_str("        Generated by seedrun\n");
        html.push_str("    </div>\n");

        html.push_str("</body>\n");
        html.push_str("</html>\n");

        html
    }
}
