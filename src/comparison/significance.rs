// Significance estimate for a difference of means
//
// Approximates the difference of two sample means as a normal variable with
// mean `mean_a - mean_b` and variance `sigma_a^2 + sigma_b^2`, and reports the
// probability mass above zero.
//
// This is an approximation for ranking and coloring, not a hypothesis test:
// there is no Welch–Satterthwaite degrees-of-freedom correction, and the
// per-sample stdevs are used directly (not divided by sqrt(n)).

use super::distribution::Distribution;
use std::f64::consts::SQRT_2;

/// Probability that a normal variable with the given mean and stdev is positive
///
/// A zero stdev degenerates to a step: 1 above zero, 0 below, 0.5 at zero.
pub fn prob_normal_positive(mean: f64, sigma: f64) -> f64 {
    if sigma == 0.0 {
        return if mean > 0.0 {
            1.0
        } else if mean < 0.0 {
            0.0
        } else {
            0.5
        };
    }
    0.5 * (1.0 + libm::erf(mean / (SQRT_2 * sigma)))
}

/// Probability that the true mean of `a` exceeds the true mean of `b`
///
/// Returns 0.5 when either side has no samples. A single-sample side has no
/// variance estimate of its own and borrows the other side's stdev.
pub fn prob_mean_exceeds(a: &Distribution, b: &Distribution) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.5;
    }
    let diff_mean = a.mean() - b.mean();

    let mut sigma_a = a.sample_stdev();
    let mut sigma_b = b.sample_stdev();
    if b.n() == 1 {
        sigma_b = sigma_a;
    }
    if a.n() == 1 {
        sigma_a = sigma_b;
    }

    let diff_sigma = (sigma_a * sigma_a + sigma_b * sigma_b).sqrt();
    prob_normal_positive(diff_mean, diff_sigma)
}
