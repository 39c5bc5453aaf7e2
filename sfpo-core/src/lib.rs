#![warn(missing_docs)]
//! SFPO Core - Measurement Reduction
//!
//! This crate reduces raw force-displacement curves from single-fiber
//! pull-out tests into per-specimen features and aggregates them per
//! measurement series:
//! - `Curve` model with the ingestion domain filter
//! - Per-specimen feature extraction (peak force, embedding length, IFSS,
//!   trapezoidal work, decile work intervals, force modulus)
//! - `SeriesAggregator` for per-feature means, stddevs and z-scores
//!
//! All degenerate numeric inputs (zero geometry, zero total work) are
//! substituted with validity-tagged sentinels and logged; only structural
//! misuse (empty curve, unknown feature name) is an error.

mod curve;
mod features;
mod reduce;
mod series;

pub use curve::{Curve, CurvePoint};
pub use features::{FeatureKind, FeatureValue, SpecimenFeatures, UnknownFeatureError};
pub use reduce::{
    ReduceError, area_normalized_work, embedding_length, force_modulus, ifss, max_force,
    max_force_index, normed_intervals, reduce_specimen, work, work_intervals, work_segments,
};
pub use series::{
    CumulativeWorkStat, IntervalStatistics, SeriesAggregator, ZScoreResult,
};

/// Number of equal-percentage partitions of the embedding length.
pub const WORK_INTERVAL_COUNT: usize = 10;

/// Default embedding-length cutoff in micrometers.
pub const DEFAULT_EMBEDDING_CUTOFF_UM: f64 = 1000.0;

/// Round to a fixed number of decimal places.
///
/// Every feature is rounded exactly once, at the boundary of the operation
/// that produces it, so exported values are reproducible across runs.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(WORK_INTERVAL_COUNT, 10);
        assert!((DEFAULT_EMBEDDING_CUTOFF_UM - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(26.5258, 2) - 26.53).abs() < 1e-12);
        assert!((round_to(47.4999, 3) - 47.5).abs() < 1e-12);
        assert!((round_to(-0.12344, 4) - (-0.1234)).abs() < 1e-12);
    }
}
