// Statistical comparison of two runs
//
// Per-seed metrics are folded into online distributions (O(1) memory per
// metric per group), and the difference of means between candidate and
// baseline is scored with a Gaussian approximation:
//
//   P(mean_a > mean_b) ≈ Φ((mean_a - mean_b) / sqrt(σa² + σb²))
//
// Degenerate inputs never fail. An empty side gives 0.5, an empty
// distribution summarizes as "--".

mod distribution;
mod groups;
mod report;
mod significance;

pub use distribution::{Distribution, Summary, CONSTANT_STDEV};
pub use groups::{build_groups, compare_seeds, Group, ALL_GROUP};
pub use report::{
    color_prob, compare, ComparisonReport, DeltaCell, GroupRow, MetricCell, TRACKED_METRICS,
};
pub use significance::{prob_mean_exceeds, prob_normal_positive};

#[cfg(test)]
mod tests;
