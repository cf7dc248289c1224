// Grouped comparison of a candidate run against a baseline run
//
// For every seed group the report carries the candidate's elapsed and Score
// distributions, and, where both runs share seeds, the per-seed Score delta
// with a significance probability used for coloring.

use super::distribution::Distribution;
use super::groups::{build_groups, Group};
use super::significance::prob_mean_exceeds;
use crate::trial::TrialResult;
use std::collections::HashMap;

/// Metrics summarized for the candidate in every group, with display labels
pub const TRACKED_METRICS: &[(&str, &str)] = &[("elapsed", "time"), ("Score", "score")];

/// Distribution of one tracked metric within a group
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCell {
    pub metric: &'static str,
    pub label: &'static str,
    pub distribution: Distribution,
}

/// Score delta between candidate and baseline within a group
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaCell {
    /// `candidate.Score - baseline.Score` per shared seed
    pub distribution: Distribution,
    /// Probability that the candidate's mean Score exceeds the baseline's
    pub prob_better: f64,
}

/// One row of the comparison table
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub name: String,
    pub metrics: Vec<MetricCell>,
    /// Absent when the group shares no seeds with the baseline
    pub delta: Option<DeltaCell>,
}

impl GroupRow {
    pub fn metric(&self, metric: &str) -> Option<&Distribution> {
        self.metrics
            .iter()
            .find(|cell| cell.metric == metric)
            .map(|cell| &cell.distribution)
    }
}

/// Comparison table, "all" row first
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub rows: Vec<GroupRow>,
}

impl ComparisonReport {
    pub fn row(&self, name: &str) -> Option<&GroupRow> {
        self.rows.iter().find(|row| row.name == name)
    }
}

fn by_seed(results: &[TrialResult]) -> HashMap<&str, &TrialResult> {
    // Later results for a repeated seed replace earlier ones
    results.iter().map(|r| (r.seed.as_str(), r)).collect()
}

/// Compare candidate results against baseline results, grouped by seed
///
/// Seeds missing from the candidate are skipped in the metric cells; the
/// delta only covers seeds present in both runs.
pub fn compare(candidate: &[TrialResult], baseline: &[TrialResult]) -> ComparisonReport {
    let candidate_by_seed = by_seed(candidate);
    let baseline_by_seed = by_seed(baseline);

    let groups = build_groups(
        candidate_by_seed
            .keys()
            .chain(baseline_by_seed.keys())
            .copied(),
    );

    let rows = groups
        .iter()
        .map(|group| build_row(group, &candidate_by_seed, &baseline_by_seed))
        .collect();

    ComparisonReport { rows }
}

fn build_row(
    group: &Group,
    candidate: &HashMap<&str, &TrialResult>,
    baseline: &HashMap<&str, &TrialResult>,
) -> GroupRow {
    let metrics = TRACKED_METRICS
        .iter()
        .map(|&(metric, label)| MetricCell {
            metric,
            label,
            distribution: group
                .seeds
                .iter()
                .filter_map(|seed| candidate.get(seed.as_str()))
                .filter_map(|result| result.metric(metric))
                .collect(),
        })
        .collect();

    let mut delta = Distribution::new();
    let mut candidate_scores = Distribution::new();
    let mut baseline_scores = Distribution::new();
    for seed in &group.seeds {
        if let (Some(c), Some(b)) = (candidate.get(seed.as_str()), baseline.get(seed.as_str())) {
            delta.add(c.score - b.score);
            candidate_scores.add(c.score);
            baseline_scores.add(b.score);
        }
    }

    let delta = (!delta.is_empty()).then(|| DeltaCell {
        distribution: delta,
        prob_better: prob_mean_exceeds(&candidate_scores, &baseline_scores),
    });

    GroupRow {
        name: group.name.clone(),
        metrics,
        delta,
    }
}

/// Map a probability to a red/green hex color
///
/// Below 0.5 the red channel grows with `1 - 2p`; from 0.5 up the green
/// channel grows with `2p - 1`. Exactly 0.5 is black.
pub fn color_prob(p: f64) -> String {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        let red = 1.0 - 2.0 * p;
        format!("#{:x}00", (15.0 * red) as u8)
    } else {
        let green = 2.0 * p - 1.0;
        format!("#0{:x}0", (15.0 * green) as u8)
    }
}
