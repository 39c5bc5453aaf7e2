//! Percentile Computation
//!
//! Linear interpolation between nearest ranks, matching the convention the
//! historical analysis pipeline used for confidence-interval bounds.

/// Compute a single percentile (0..=100) from samples.
///
/// Returns 0.0 for empty input so degenerate groups flow through aggregate
/// tables instead of aborting them.
pub fn percentile(samples: &[f64], pct: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    if samples.len() == 1 {
        return samples[0];
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let rank = pct / 100.0 * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let fraction = rank - lower as f64;

    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

pub(crate) fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

pub(crate) fn median(samples: &[f64]) -> f64 {
    percentile(samples, 50.0)
}

/// Sample standard deviation (ddof = 1); 0.0 for fewer than two samples.
pub(crate) fn sample_std(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let variance =
        samples.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (samples.len() - 1) as f64;
    variance.sqrt()
}
