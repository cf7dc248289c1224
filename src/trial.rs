//! Trial results and candidate output parsing
//!
//! A candidate program reports its outcome on stdout or stderr:
//!
//! ```text
//! Score = 1234.5
//! # moves = 87
//! # score = 1234.5
//! ```
//!
//! `Score = <number>` is required. `# <name> = <literal>` lines become
//! auxiliary metrics. A self-reported `score` must agree with `Score`.

use crate::literal::{parse_literal, Literal, LiteralError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Maximum allowed difference between `Score` and a self-reported `score`
pub const SCORE_TOLERANCE: f64 = 1e-5;

/// Field names owned by the harness; candidates cannot override them
const RESERVED_FIELDS: &[&str] = &["seed", "elapsed"];

/// Outcome of a single trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Seed the candidate was run with
    pub seed: String,
    /// Harness-observed score
    #[serde(rename = "Score")]
    pub score: f64,
    /// Wall-clock seconds from launch to exit
    pub elapsed: f64,
    /// Auxiliary metrics reported via `# name = literal`
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Literal>,
}

impl TrialResult {
    pub fn new(seed: impl Into<String>, score: f64, elapsed: f64) -> Self {
        Self {
            seed: seed.into(),
            score,
            elapsed,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: Literal) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Numeric value of a tracked metric (`Score`, `elapsed`, or a numeric
    /// auxiliary metric)
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "Score" => Some(self.score),
            "elapsed" => Some(self.elapsed),
            other => self.metrics.get(other).and_then(Literal::as_f64),
        }
    }
}

/// Why a trial was rejected
#[derive(Debug, Error)]
pub enum FailureReason {
    #[error("failed to launch program: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("exited with {0}")]
    NonZeroExit(String),

    #[error("missing score")]
    MissingScore,

    #[error("invalid score value {0:?}")]
    InvalidScore(String),

    #[error("invalid literal for '{field}': {source}")]
    InvalidLiteral {
        field: String,
        #[source]
        source: LiteralError,
    },

    #[error("self-reported score mismatch: Score = {observed}, score = {reported}")]
    ScoreMismatch { observed: f64, reported: String },
}

/// A fatal trial failure, carrying the full captured output for postmortem
#[derive(Debug, Error)]
#[error("trial failed for seed={seed}: {reason}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
pub struct ExecutionError {
    pub seed: String,
    #[source]
    pub reason: FailureReason,
    pub stdout: String,
    pub stderr: String,
}

fn score_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Score = (.+)$").expect("valid score regex"))
}

fn metric_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^# (\w+) = (.*)$").expect("valid metric regex"))
}

/// Metrics extracted from candidate output, before validation
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedOutput {
    pub score: Option<f64>,
    pub metrics: BTreeMap<String, Literal>,
}

/// Scan stdout lines, then stderr lines, for score and metric lines.
/// Later matches overwrite earlier ones.
pub fn parse_output(stdout: &str, stderr: &str) -> Result<ParsedOutput, FailureReason> {
    let mut parsed = ParsedOutput::default();

    for line in stdout.lines().chain(stderr.lines()) {
        if let Some(caps) = score_line().captures(line) {
            let raw = caps[1].trim();
            // JSON has no inf or nan, so such a score could not be stored
            let score = raw
                .parse::<f64>()
                .ok()
                .filter(|s| s.is_finite())
                .ok_or_else(|| FailureReason::InvalidScore(raw.to_string()))?;
            parsed.score = Some(score);
        }

        if let Some(caps) = metric_line().captures(line) {
            let name = &caps[1];
            let value = parse_literal(&caps[2]).map_err(|source| FailureReason::InvalidLiteral {
                field: name.to_string(),
                source,
            })?;

            if name == "Score" {
                let score = value
                    .as_f64()
                    .ok_or_else(|| FailureReason::InvalidScore(value.to_string()))?;
                parsed.score = Some(score);
            } else if RESERVED_FIELDS.contains(&name) {
                tracing::warn!("ignoring reserved metric name '{}' in candidate output", name);
            } else {
                parsed.metrics.insert(name.to_string(), value);
            }
        }
    }

    Ok(parsed)
}

/// Check the required score and the self-reported score agreement
pub fn validate(parsed: ParsedOutput, seed: &str, elapsed: f64) -> Result<TrialResult, FailureReason> {
    let score = parsed.score.ok_or(FailureReason::MissingScore)?;

    if let Some(reported) = parsed.metrics.get("score") {
        let agrees = reported
            .as_f64()
            .is_some_and(|r| (score - r).abs() < SCORE_TOLERANCE);
        if !agrees {
            return Err(FailureReason::ScoreMismatch {
                observed: score,
                reported: reported.to_string(),
            });
        }
    }

    Ok(TrialResult {
        seed: seed.to_string(),
        score,
        elapsed,
        metrics: parsed.metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(stdout: &str) -> TrialResult {
        let parsed = parse_output(stdout, "").unwrap();
        validate(parsed, "5", 0.25).unwrap()
    }

    #[test]
    fn test_score_line() {
        let result = parse_ok("Score = 42.0\n");
        assert_eq!(result.seed, "5");
        assert_eq!(result.score, 42.0);
        assert_eq!(result.elapsed, 0.25);
        assert!(result.metrics.is_empty());
    }

    #[test]
    fn test_last_score_wins() {
        let result = parse_ok("Score = 1\nnoise\nScore = 2\n");
        assert_eq!(result.score, 2.0);
    }

    #[test]
    fn test_stderr_scanned_after_stdout() {
        let parsed = parse_output("Score = 1\n", "Score = 3\n# moves = 4\n").unwrap();
        assert_eq!(parsed.score, Some(3.0));
        assert_eq!(parsed.metrics["moves"], Literal::Int(4));
    }

    #[test]
    fn test_score_must_start_line() {
        let parsed = parse_output("Final Score = 10\n", "").unwrap();
        assert_eq!(parsed.score, None);
    }

    #[test]
    fn test_auxiliary_metrics() {
        let result = parse_ok("# moves = [1, 2]\n# name = 'greedy'\nScore = 7\n");
        assert_eq!(
            result.metrics["moves"],
            Literal::List(vec![Literal::Int(1), Literal::Int(2)])
        );
        assert_eq!(result.metrics["name"], Literal::Str("greedy".to_string()));
        assert_eq!(result.metric("Score"), Some(7.0));
        assert_eq!(result.metric("name"), None);
    }

    #[test]
    fn test_hash_score_sets_score() {
        let result = parse_ok("Score = 1\n# Score = 9\n");
        assert_eq!(result.score, 9.0);
        assert!(!result.metrics.contains_key("Score"));
    }

    #[test]
    fn test_reserved_names_ignored() {
        let result = parse_ok("Score = 1\n# seed = 99\n# elapsed = 3.5\n");
        assert_eq!(result.seed, "5");
        assert_eq!(result.elapsed, 0.25);
        assert!(result.metrics.is_empty());
    }

    #[test]
    fn test_missing_score() {
        let parsed = parse_output("# moves = 3\n", "").unwrap();
        let err = validate(parsed, "1", 0.0).unwrap_err();
        assert!(matches!(err, FailureReason::MissingScore));
        assert_eq!(err.to_string(), "missing score");
    }

    #[test]
    fn test_invalid_score() {
        let err = parse_output("Score = lots\n", "").unwrap_err();
        assert!(matches!(err, FailureReason::InvalidScore(ref s) if s == "lots"));
    }

    #[test]
    fn test_non_finite_score_rejected() {
        for raw in ["inf", "-inf", "nan", "NaN", "infinity", "1e999"] {
            let err = parse_output(&format!("Score = {}\n", raw), "").unwrap_err();
            assert!(
                matches!(err, FailureReason::InvalidScore(ref s) if s == raw),
                "accepted Score = {}",
                raw
            );
        }
        assert!(parse_output("# Score = 1e999\n", "").is_err());
    }

    #[test]
    fn test_invalid_literal() {
        let err = parse_output("# x = os.system('rm')\n", "").unwrap_err();
        assert!(matches!(err, FailureReason::InvalidLiteral { ref field, .. } if field == "x"));
    }

    #[test]
    fn test_self_reported_score_mismatch() {
        let parsed = parse_output("Score = 42.0\n# score = 42.1\n", "").unwrap();
        let err = validate(parsed, "5", 0.0).unwrap_err();
        assert!(matches!(err, FailureReason::ScoreMismatch { .. }));
        assert!(err.to_string().contains("self-reported score mismatch"));
    }

    #[test]
    fn test_self_reported_score_within_tolerance() {
        let result = parse_ok("Score = 42.0\n# score = 42.000001\n");
        assert_eq!(result.score, 42.0);
        assert_eq!(result.metrics["score"], Literal::Float(42.000001));
    }

    #[test]
    fn test_non_numeric_self_reported_score() {
        let parsed = parse_output("Score = 1\n# score = 'one'\n", "").unwrap();
        assert!(matches!(
            validate(parsed, "5", 0.0),
            Err(FailureReason::ScoreMismatch { .. })
        ));
    }

    #[test]
    fn test_result_serializes_flat() {
        let result = TrialResult::new("7", 3.5, 0.5).with_metric("moves", Literal::Int(2));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["seed"], "7");
        assert_eq!(json["Score"], 3.5);
        assert_eq!(json["elapsed"], 0.5);
        assert_eq!(json["moves"], 2);

        let back: TrialResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
