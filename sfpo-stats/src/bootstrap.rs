//! Bootstrap Resampling
//!
//! Builds sampling distributions of the mean, median and sample standard
//! deviation by drawing with replacement, and derives percentile confidence
//! intervals from them.
//!
//! Each iteration uses an RNG derived from `(seed, iteration index)`, so a
//! fixed seed reproduces the result bit-for-bit whether iterations run
//! serially or on the rayon pool.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::percentile::{mean, median, percentile, sample_std};
use crate::{DEFAULT_BOOTSTRAP_ITERATIONS, DEFAULT_SEED};

/// Per-iteration seed stride (golden-ratio increment) keeping iteration
/// streams disjoint.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Bootstrap configuration.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Number of bootstrap iterations (default: 1000).
    pub iterations: usize,
    /// Seed for the resampling streams; results are a pure function of
    /// (data, iterations, seed).
    pub seed: u64,
    /// Whether to run iterations on the rayon pool. Does not change results.
    pub parallel: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_BOOTSTRAP_ITERATIONS,
            seed: DEFAULT_SEED,
            parallel: true,
        }
    }
}

/// Percentile confidence interval bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
    /// Confidence level, e.g. 0.95.
    pub level: f64,
}

impl ConfidenceInterval {
    fn nan(level: f64) -> Self {
        Self {
            lower: f64::NAN,
            upper: f64::NAN,
            level,
        }
    }

    /// Whether a value lies inside the interval.
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Result of bootstrapping one named group's values.
#[derive(Debug, Clone)]
pub struct BootstrapResult {
    /// Resampled means, one per iteration.
    pub means: Vec<f64>,
    /// Resampled medians, one per iteration.
    pub medians: Vec<f64>,
    /// Resampled sample standard deviations (ddof = 1), one per iteration.
    pub std_devs: Vec<f64>,
    /// 95% percentile CI of the mean distribution.
    pub ci_mean: ConfidenceInterval,
    /// 90% percentile CI of the mean distribution.
    pub ci_mean_90: ConfidenceInterval,
    /// 95% percentile CI of the median distribution.
    pub ci_median: ConfidenceInterval,
    /// 95% percentile CI of the stddev distribution.
    pub ci_std: ConfidenceInterval,
    /// Mean of the original data.
    pub original_mean: f64,
    /// Median of the original data.
    pub original_median: f64,
    /// Sample standard deviation of the original data.
    pub original_std: f64,
}

impl BootstrapResult {
    fn empty() -> Self {
        Self {
            means: Vec::new(),
            medians: Vec::new(),
            std_devs: Vec::new(),
            ci_mean: ConfidenceInterval::nan(0.95),
            ci_mean_90: ConfidenceInterval::nan(0.90),
            ci_median: ConfidenceInterval::nan(0.95),
            ci_std: ConfidenceInterval::nan(0.95),
            original_mean: f64::NAN,
            original_median: f64::NAN,
            original_std: f64::NAN,
        }
    }

    /// Whether the input group was empty and no distribution was built.
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

fn iteration_rng(seed: u64, index: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add((index + 1).wrapping_mul(SEED_STRIDE)))
}

fn resample_once(data: &[f64], rng: &mut StdRng) -> (f64, f64, f64) {
    let n = data.len();
    let sample: Vec<f64> = (0..n).map(|_| data[rng.gen_range(0..n)]).collect();
    (mean(&sample), median(&sample), sample_std(&sample))
}

fn percentile_interval(distribution: &[f64], level: f64) -> ConfidenceInterval {
    let alpha = (1.0 - level) / 2.0 * 100.0;
    ConfidenceInterval {
        lower: percentile(distribution, alpha),
        upper: percentile(distribution, 100.0 - alpha),
        level,
    }
}

/// Resample one group's values and derive confidence intervals.
///
/// Empty input yields the empty/NaN result (logged) rather than an error:
/// this runs across heterogeneous groups where some may be unpopulated, and
/// one empty group must not abort the batch.
pub fn resample(data: &[f64], config: &BootstrapConfig) -> BootstrapResult {
    if data.is_empty() {
        warn!("empty data for bootstrap resampling");
        return BootstrapResult::empty();
    }
    debug!(
        n = data.len(),
        iterations = config.iterations,
        "bootstrap resampling"
    );

    let stats: Vec<(f64, f64, f64)> = if config.parallel {
        (0..config.iterations)
            .into_par_iter()
            .map(|i| resample_once(data, &mut iteration_rng(config.seed, i as u64)))
            .collect()
    } else {
        (0..config.iterations)
            .map(|i| resample_once(data, &mut iteration_rng(config.seed, i as u64)))
            .collect()
    };

    let means: Vec<f64> = stats.iter().map(|s| s.0).collect();
    let medians: Vec<f64> = stats.iter().map(|s| s.1).collect();
    let std_devs: Vec<f64> = stats.iter().map(|s| s.2).collect();

    BootstrapResult {
        ci_mean: percentile_interval(&means, 0.95),
        ci_mean_90: percentile_interval(&means, 0.90),
        ci_median: percentile_interval(&medians, 0.95),
        ci_std: percentile_interval(&std_devs, 0.95),
        original_mean: mean(data),
        original_median: median(data),
        original_std: sample_std(data),
        means,
        medians,
        std_devs,
    }
}

/// Expand a small group to `target_size` values for ANOVA.
///
/// Draws `iterations × len(data)` values with replacement into a pool, then
/// samples `target_size` of them - without replacement when the pool is large
/// enough, with replacement otherwise. Size equalization before ANOVA is the
/// established methodology of this pipeline; it inflates the apparent sample
/// size and is reported to stakeholders as such.
pub fn expand_for_anova(data: &[f64], target_size: usize, config: &BootstrapConfig) -> Vec<f64> {
    if data.is_empty() {
        warn!("empty data for bootstrap expansion");
        return Vec::new();
    }

    let n = data.len();
    let mut pool = Vec::with_capacity(config.iterations * n);
    for i in 0..config.iterations {
        let mut rng = iteration_rng(config.seed, i as u64);
        for _ in 0..n {
            pool.push(data[rng.gen_range(0..n)]);
        }
    }

    let mut rng = iteration_rng(config.seed, config.iterations as u64);
    let expanded: Vec<f64> = if pool.len() >= target_size {
        pool.choose_multiple(&mut rng, target_size).copied().collect()
    } else {
        (0..target_size)
            .map(|_| pool[rng.gen_range(0..pool.len())])
            .collect()
    };

    debug!(from = n, to = target_size, "expanded group via bootstrap");
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(iterations: usize, parallel: bool) -> BootstrapConfig {
        BootstrapConfig {
            iterations,
            seed: DEFAULT_SEED,
            parallel,
        }
    }

    #[test]
    fn test_ci_contains_point_estimate() {
        let data = vec![10.0, 12.0, 9.0, 11.0, 13.0, 10.5, 11.5];
        let result = resample(&data, &config(500, true));

        assert!(result.ci_mean.contains(result.original_mean));
        assert!(result.ci_mean_90.contains(result.original_mean));
        assert_eq!(result.means.len(), 500);
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let a = resample(&data, &config(200, true));
        let b = resample(&data, &config(200, true));
        assert_eq!(a.means, b.means);
        assert_eq!(a.ci_mean, b.ci_mean);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let parallel = resample(&data, &config(300, true));
        let serial = resample(&data, &config(300, false));
        assert_eq!(parallel.means, serial.means);
        assert_eq!(parallel.medians, serial.medians);
        assert_eq!(parallel.std_devs, serial.std_devs);
    }

    #[test]
    fn test_different_seeds_differ() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let a = resample(&data, &BootstrapConfig {
            seed: 1,
            ..config(200, false)
        });
        let b = resample(&data, &BootstrapConfig {
            seed: 2,
            ..config(200, false)
        });
        assert_ne!(a.means, b.means);
    }

    #[test]
    fn test_constant_data() {
        let data = vec![5.0, 5.0, 5.0, 5.0, 5.0];
        let result = resample(&data, &config(400, true));

        assert!((result.ci_mean.lower - 5.0).abs() < f64::EPSILON);
        assert!((result.ci_mean.upper - 5.0).abs() < f64::EPSILON);
        assert!(result.std_devs.iter().all(|&s| s == 0.0));
        assert!((result.original_std - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_input_degrades_gracefully() {
        let result = resample(&[], &config(100, true));
        assert!(result.is_empty());
        assert!(result.ci_mean.lower.is_nan());
        assert!(result.original_mean.is_nan());
    }

    #[test]
    fn test_expand_for_anova_size_and_support() {
        let data = vec![1.0, 2.0, 3.0];
        let expanded = expand_for_anova(&data, 10, &config(100, false));
        assert_eq!(expanded.len(), 10);
        assert!(expanded.iter().all(|v| data.contains(v)));
    }

    #[test]
    fn test_expand_for_anova_is_deterministic() {
        let data = vec![4.0, 8.0, 15.0, 16.0, 23.0, 42.0];
        let a = expand_for_anova(&data, 10, &config(100, false));
        let b = expand_for_anova(&data, 10, &config(100, false));
        assert_eq!(a, b);
    }

    #[test]
    fn test_expand_for_anova_small_pool_draws_with_replacement() {
        let data = vec![7.0];
        let expanded = expand_for_anova(&data, 10, &BootstrapConfig {
            iterations: 3,
            seed: DEFAULT_SEED,
            parallel: false,
        });
        assert_eq!(expanded.len(), 10);
        assert!(expanded.iter().all(|&v| (v - 7.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_expand_for_anova_empty_input() {
        assert!(expand_for_anova(&[], 10, &BootstrapConfig::default()).is_empty());
    }
}
