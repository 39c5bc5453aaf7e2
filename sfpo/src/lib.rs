#![warn(missing_docs)]
//! # SFPO
//!
//! Analysis engine for single-fiber pull-out (SFPO) mechanical tests:
//! reduces raw force-displacement curves into per-specimen metrics,
//! aggregates them per measurement series, and compares series with
//! inferential statistics.
//!
//! - **Reduction** (`sfpo-core`): peak force, embedding length, IFSS,
//!   trapezoidal work, decile work intervals, force modulus, pre/post-peak
//!   work split, area-normalized work
//! - **Aggregation** (`sfpo-core`): per-feature means/stddevs, classical and
//!   robust z-scores, normalized-interval statistics
//! - **Inference** (`sfpo-stats`): seeded bootstrap confidence intervals,
//!   one-way ANOVA with Shapiro-Wilk/Levene diagnostics, η² effect size and
//!   Tukey HSD post-hoc comparison
//! - **Export** (`sfpo-report`): flat numeric records, JSON and CSV
//!
//! ## Quick Start
//!
//! ```
//! use sfpo::prelude::*;
//!
//! let config = AnalysisConfig::default();
//! let curve = Curve::from_pairs([
//!     (0.0, 0.0),
//!     (100.0, 0.1),
//!     (200.0, 0.2),
//!     (300.0, 0.15),
//!     (400.0, 0.05),
//! ]);
//!
//! let series_a = reduce_series("series-a", &[(curve, 6.0)], &config);
//! assert!((series_a.specimens[0].max_force - 0.2).abs() < 1e-12);
//! ```
//!
//! The engine holds no global state: configuration and the random seed are
//! passed explicitly, so independent series can be processed on independent
//! workers with reproducible results.

mod config;
pub mod study;

pub use config::{AnalysisConfig, ConfigError};
pub use study::{
    AnalyzedSeries, DEFAULT_STUDY_FEATURES, StudyResult, build_report, extract_feature_groups,
    reduce_series, run_study,
};

// Re-export the engine surface for callers that want a single dependency.
pub use sfpo_core::{
    Curve, CurvePoint, DEFAULT_EMBEDDING_CUTOFF_UM, FeatureKind, FeatureValue, ReduceError,
    SeriesAggregator, SpecimenFeatures, UnknownFeatureError, ZScoreResult, reduce_specimen,
};
pub use sfpo_report::{Report, generate_csv_report, generate_json_report};
pub use sfpo_stats::{
    AnovaConfig, AnovaError, AnovaResult, BootstrapConfig, BootstrapResult, Group, TestStatistic,
    TukeyComparison, compare_groups, expand_for_anova, resample,
};

/// Commonly used types and entry points.
pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::study::{
        AnalyzedSeries, DEFAULT_STUDY_FEATURES, build_report, reduce_series, run_study,
    };
    pub use sfpo_core::{Curve, CurvePoint, FeatureKind, SpecimenFeatures, reduce_specimen};
    pub use sfpo_report::{generate_csv_report, generate_json_report};
    pub use sfpo_stats::{Group, compare_groups, resample};
}
