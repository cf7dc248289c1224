//! JSON output format for comparison reports

use crate::comparison::{ComparisonReport, Distribution};
use serde::{Deserialize, Serialize};

/// Summary statistics of one distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDistribution {
    pub n: u64,
    pub mean: f64,
    pub stdev: f64,
    /// Absent for an empty distribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Display text (`--`, `5.000`, `2.000 ± 1.000`)
    pub summary: String,
}

impl From<&Distribution> for JsonDistribution {
    fn from(d: &Distribution) -> Self {
        let has_data = !d.is_empty();
        Self {
            n: d.n(),
            mean: d.mean(),
            stdev: d.sample_stdev(),
            min: has_data.then(|| d.min()),
            max: has_data.then(|| d.max()),
            summary: d.summarize().to_string(),
        }
    }
}

/// Score delta of one group against the baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDelta {
    #[serde(flatten)]
    pub distribution: JsonDistribution,
    pub prob_better: f64,
}

/// One row of the comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonGroup {
    pub group: String,
    pub elapsed: JsonDistribution,
    pub score: JsonDistribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<JsonDelta>,
}

/// Complete JSON comparison document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_id: Option<String>,
    pub groups: Vec<JsonGroup>,
}

impl JsonOutput {
    pub fn new(run_id: &str, baseline_id: Option<&str>, report: &ComparisonReport) -> Self {
        let empty = Distribution::new();
        let groups = report
            .rows
            .iter()
            .map(|row| JsonGroup {
                group: row.name.clone(),
                elapsed: row.metric("elapsed").unwrap_or(&empty).into(),
                score: row.metric("Score").unwrap_or(&empty).into(),
                delta: row.delta.as_ref().map(|delta| JsonDelta {
                    distribution: (&delta.distribution).into(),
                    prob_better: delta.prob_better,
                }),
            })
            .collect();

        Self {
            run_id: run_id.to_string(),
            baseline_id: baseline_id.map(str::to_string),
            groups,
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
