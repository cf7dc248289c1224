// Online accumulator for a scalar sample stream
//
// Keeps count, sum, sum of squares and extremes. No samples are retained, so
// every update is O(1) time and memory.

use std::fmt;

/// Stdev below which a distribution is displayed as a constant
pub const CONSTANT_STDEV: f64 = 1e-10;

/// Running summary of a stream of values
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    n: u64,
    sum: f64,
    sum2: f64,
    min: f64,
    max: f64,
}

impl Default for Distribution {
    fn default() -> Self {
        Self::new()
    }
}

impl Distribution {
    pub fn new() -> Self {
        Self {
            n: 0,
            sum: 0.0,
            sum2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, x: f64) {
        self.n += 1;
        self.sum += x;
        self.sum2 += x * x;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Smallest value seen (`+inf` when empty)
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest value seen (`-inf` when empty)
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Mean, or 0 for an empty distribution
    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.sum / self.n as f64
    }

    /// Unbiased sample standard deviation, 0 with fewer than two samples
    pub fn sample_stdev(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        let n = self.n as f64;
        let mean = self.mean();
        let variance = (self.sum2 - 2.0 * mean * self.sum + mean * mean * n) / (n - 1.0);
        // Rounding can push a zero variance slightly negative
        variance.max(0.0).sqrt()
    }

    pub fn summarize(&self) -> Summary {
        if self.n == 0 {
            return Summary::Empty;
        }
        let stdev = self.sample_stdev();
        if stdev < CONSTANT_STDEV {
            return Summary::Constant(self.mean());
        }
        Summary::Spread {
            mean: self.mean(),
            stdev,
            min: self.min,
            max: self.max,
            n: self.n,
        }
    }
}

impl Extend<f64> for Distribution {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl FromIterator<f64> for Distribution {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut d = Distribution::new();
        d.extend(iter);
        d
    }
}

/// Display form of a distribution
///
/// `Display` gives the cell text (`--`, `5.000`, `2.000 ± 1.000`); the
/// `min`/`max`/`n` fields of a spread are context for tooltips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Summary {
    Empty,
    Constant(f64),
    Spread {
        mean: f64,
        stdev: f64,
        min: f64,
        max: f64,
        n: u64,
    },
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Empty => write!(f, "--"),
            Summary::Constant(value) => write!(f, "{:.3}", value),
            Summary::Spread { mean, stdev, .. } => write!(f, "{:.3} ± {:.3}", mean, stdev),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stats() {
        let d: Distribution = [1.0, 2.0, 3.0].into_iter().collect();
        assert_eq!(d.n(), 3);
        assert_eq!(d.mean(), 2.0);
        assert_eq!(d.min(), 1.0);
        assert_eq!(d.max(), 3.0);
        assert!((d.sample_stdev() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty() {
        let d = Distribution::new();
        assert!(d.is_empty());
        assert_eq!(d.mean(), 0.0);
        assert_eq!(d.sample_stdev(), 0.0);
        assert_eq!(d.summarize(), Summary::Empty);
        assert_eq!(d.summarize().to_string(), "--");
    }

    #[test]
    fn test_single_value_is_constant() {
        let mut d = Distribution::new();
        d.add(5.0);
        assert_eq!(d.sample_stdev(), 0.0);
        assert_eq!(d.summarize().to_string(), "5.000");
    }

    #[test]
    fn test_repeated_value_is_constant() {
        let d: Distribution = std::iter::repeat(2.5).take(1000).collect();
        assert!(d.sample_stdev() < CONSTANT_STDEV);
        assert_eq!(d.summarize().to_string(), "2.500");
    }

    #[test]
    fn test_spread_summary() {
        let d: Distribution = [1.0, 2.0, 3.0].into_iter().collect();
        assert_eq!(d.summarize().to_string(), "2.000 ± 1.000");
        match d.summarize() {
            Summary::Spread { min, max, n, .. } => {
                assert_eq!(min, 1.0);
                assert_eq!(max, 3.0);
                assert_eq!(n, 3);
            }
            other => panic!("expected spread, got {:?}", other),
        }
    }

    #[test]
    fn test_large_offset_variance_never_negative() {
        let d: Distribution = [1e9 + 0.1, 1e9 + 0.1, 1e9 + 0.1].into_iter().collect();
        assert!(d.sample_stdev() >= 0.0);
        assert!(!d.sample_stdev().is_nan());
    }
}
