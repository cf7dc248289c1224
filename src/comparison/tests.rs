// Comparison report tests with realistic run shapes

use super::*;
use crate::literal::Literal;
use crate::trial::TrialResult;

fn result(seed: &str, score: f64, elapsed: f64) -> TrialResult {
    TrialResult::new(seed, score, elapsed)
}

/// Candidate covers seeds {1,2}, baseline covers {2,3}: only "all" and "2"
/// share seeds, so only they get a delta
#[test]
fn test_delta_only_for_overlapping_groups() {
    let candidate = vec![result("1", 10.0, 0.5), result("2", 20.0, 0.7)];
    let baseline = vec![result("2", 15.0, 0.6), result("3", 30.0, 0.9)];

    let report = compare(&candidate, &baseline);
    let names: Vec<&str> = report.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["all", "1", "2", "3"]);

    let with_delta: Vec<&str> = report
        .rows
        .iter()
        .filter(|r| r.delta.is_some())
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(with_delta, vec!["all", "2"]);

    let delta = report.row("2").unwrap().delta.as_ref().unwrap();
    assert_eq!(delta.distribution.mean(), 5.0);
    assert_eq!(delta.prob_better, 1.0);
}

#[test]
fn test_candidate_metrics_skip_missing_seeds() {
    let candidate = vec![result("1", 10.0, 0.5), result("2", 20.0, 1.5)];
    let baseline = vec![result("3", 30.0, 0.9)];

    let report = compare(&candidate, &baseline);

    let all = report.row("all").unwrap();
    assert_eq!(all.metric("Score").unwrap().n(), 2);
    assert_eq!(all.metric("Score").unwrap().mean(), 15.0);
    assert_eq!(all.metric("elapsed").unwrap().mean(), 1.0);
    assert!(all.delta.is_none());

    // Seed 3 exists only in the baseline
    let three = report.row("3").unwrap();
    assert!(three.metric("Score").unwrap().is_empty());
    assert_eq!(three.metric("Score").unwrap().summarize().to_string(), "--");
}

#[test]
fn test_metric_columns_in_order() {
    let report = compare(&[result("1", 1.0, 0.1)], &[]);
    let labels: Vec<&str> = report.rows[0].metrics.iter().map(|m| m.label).collect();
    assert_eq!(labels, vec!["time", "score"]);
}

#[test]
fn test_no_baseline() {
    let candidate = vec![result("100", 1.0, 0.1), result("101", 3.0, 0.2)];
    let report = compare(&candidate, &[]);
    assert_eq!(report.rows.len(), 3);
    assert!(report.rows.iter().all(|r| r.delta.is_none()));
    assert_eq!(
        report.row("all").unwrap().metric("Score").unwrap().summarize().to_string(),
        "2.000 ± 1.414"
    );
}

#[test]
fn test_identical_runs_are_neutral() {
    let run = vec![
        result("1", 10.0, 0.1),
        result("2", 12.0, 0.1),
        result("3", 14.0, 0.1),
    ];
    let report = compare(&run, &run);
    let all = report.row("all").unwrap().delta.as_ref().unwrap();
    assert_eq!(all.distribution.mean(), 0.0);
    assert_eq!(all.prob_better, 0.5);
    assert_eq!(color_prob(all.prob_better), "#000");
}

#[test]
fn test_clear_improvement_is_green() {
    let candidate: Vec<_> = (0..10)
        .map(|i| result(&i.to_string(), 100.0 + i as f64, 0.1))
        .collect();
    let baseline: Vec<_> = (0..10)
        .map(|i| result(&i.to_string(), 50.0 + i as f64, 0.1))
        .collect();

    let report = compare(&candidate, &baseline);
    let all = report.row("all").unwrap().delta.as_ref().unwrap();
    assert_eq!(all.distribution.summarize().to_string(), "50.000");
    assert!(all.prob_better > 0.99);
    assert_eq!(color_prob(all.prob_better), "#0f0");
}

#[test]
fn test_duplicate_seed_last_wins() {
    let candidate = vec![result("1", 1.0, 0.1), result("1", 5.0, 0.1)];
    let report = compare(&candidate, &[]);
    assert_eq!(report.row("1").unwrap().metric("Score").unwrap().mean(), 5.0);
    assert_eq!(report.rows.len(), 2);
}

#[test]
fn test_auxiliary_metrics_do_not_leak_into_columns() {
    let candidate = vec![result("1", 1.0, 0.1).with_metric("moves", Literal::Int(4))];
    let report = compare(&candidate, &[]);
    assert_eq!(report.rows[0].metrics.len(), TRACKED_METRICS.len());
}

#[test]
fn test_color_prob_extremes() {
    assert_eq!(color_prob(0.0), "#f00");
    assert_eq!(color_prob(1.0), "#0f0");
    assert_eq!(color_prob(0.5), "#000");
    assert_eq!(color_prob(0.25), "#700");
    assert_eq!(color_prob(0.75), "#070");
}

#[test]
fn test_color_prob_clamps() {
    assert_eq!(color_prob(-1.0), "#f00");
    assert_eq!(color_prob(2.0), "#0f0");
}
