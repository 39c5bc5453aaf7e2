//! Report Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sfpo_core::{FeatureKind, SeriesAggregator, SpecimenFeatures};
use sfpo_stats::{AnovaResult, BootstrapResult};

/// Schema version of the report layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run metadata.
    pub meta: ReportMeta,
    /// One row per reduced specimen.
    pub specimens: Vec<SpecimenRecord>,
    /// Per-series per-feature aggregate rows.
    pub series_features: Vec<SeriesFeatureRecord>,
    /// Per-series normalized work-interval rows.
    pub intervals: Vec<IntervalRecord>,
    /// Bootstrap confidence intervals per feature and group.
    pub bootstrap: Vec<BootstrapRecord>,
    /// One omnibus ANOVA row per compared feature.
    pub anova: Vec<AnovaRecord>,
    /// Tukey HSD pairwise rows for significant features.
    pub posthoc: Vec<PosthocRecord>,
}

impl Report {
    /// An empty report carrying only metadata.
    pub fn new(meta: ReportMeta) -> Self {
        Self {
            meta,
            specimens: Vec::new(),
            series_features: Vec::new(),
            intervals: Vec::new(),
            bootstrap: Vec::new(),
            anova: Vec::new(),
            posthoc: Vec::new(),
        }
    }
}

/// Report metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Layout version of this report.
    pub schema_version: u32,
    /// Engine version that produced the report.
    pub version: String,
    /// Generation time.
    pub timestamp: DateTime<Utc>,
    /// Seed all resampling flowed from.
    pub seed: u64,
}

impl ReportMeta {
    /// Metadata stamped with the current time and the run's seed.
    pub fn new(seed: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            seed,
        }
    }
}

/// One reduced specimen as a flat row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecimenRecord {
    /// Series the specimen belongs to.
    pub series: String,
    /// Zero-based specimen index within the series.
    pub specimen: usize,
    /// Peak force in N.
    pub max_force: f64,
    /// Embedding length in µm.
    pub embedding_length: f64,
    /// Fiber diameter in µm.
    pub fiber_diameter: f64,
    /// Apparent interfacial shear strength in MPa (0.0 when invalid).
    pub ifss: f64,
    /// Whether the IFSS value is valid.
    pub ifss_valid: bool,
    /// Total pull-out work in µJ.
    pub work: f64,
    /// Pre-peak stiffness proxy in N/µm (0.0 when invalid).
    pub force_modulus: f64,
    /// Whether the force modulus is valid.
    pub force_modulus_valid: bool,
    /// Work before the peak force in µJ.
    pub work_before_fmax: f64,
    /// Work after the peak force in µJ.
    pub work_after_fmax: f64,
    /// Work per lateral surface in µJ/µm² (0.0 when invalid).
    pub area_normalized_work: f64,
    /// Whether the area-normalized work is valid.
    pub area_normalized_work_valid: bool,
    /// Work per decile of the embedding length, µJ.
    pub work_intervals: Vec<f64>,
    /// Decile works as fractions of total work; `None` for zero-work
    /// specimens.
    pub normed_intervals: Option<Vec<f64>>,
}

impl SpecimenRecord {
    /// Flatten one specimen's features.
    pub fn from_features(series: &str, specimen: usize, features: &SpecimenFeatures) -> Self {
        Self {
            series: series.to_string(),
            specimen,
            max_force: features.max_force,
            embedding_length: features.embedding_length,
            fiber_diameter: features.fiber_diameter,
            ifss: features.ifss.value,
            ifss_valid: features.ifss.valid,
            work: features.work,
            force_modulus: features.force_modulus.value,
            force_modulus_valid: features.force_modulus.valid,
            work_before_fmax: features.work_before_fmax,
            work_after_fmax: features.work_after_fmax,
            area_normalized_work: features.area_normalized_work.value,
            area_normalized_work_valid: features.area_normalized_work.valid,
            work_intervals: features.work_intervals.to_vec(),
            normed_intervals: features.normed_intervals.map(|n| n.to_vec()),
        }
    }
}

/// One series × feature aggregate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesFeatureRecord {
    /// Series name.
    pub series: String,
    /// Feature name (snake_case).
    pub feature: String,
    /// Number of valid values behind the statistics.
    pub count: usize,
    /// Population mean of the valid values.
    pub mean: f64,
    /// Population standard deviation of the valid values.
    pub std_dev: f64,
}

impl SeriesFeatureRecord {
    /// All feature rows of one aggregator, in export order.
    pub fn from_aggregator(aggregator: &SeriesAggregator) -> Vec<Self> {
        FeatureKind::ALL
            .into_iter()
            .map(|kind| Self {
                series: aggregator.name().to_string(),
                feature: kind.as_str().to_string(),
                count: aggregator.valid_values(kind).len(),
                mean: aggregator.mean(kind),
                std_dev: aggregator.stddev(kind),
            })
            .collect()
    }
}

/// One series × decile-position row of normalized work statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalRecord {
    /// Series name.
    pub series: String,
    /// Decile position, 1 through 10.
    pub position: usize,
    /// Mean normed work at this position.
    pub mean: f64,
    /// Population stddev at this position.
    pub std_dev: f64,
    /// `std_dev / mean`, 0 when the mean is 0.
    pub relative_std_dev: f64,
    /// Mean cumulative normed work up to this position.
    pub cumulative_mean: f64,
    /// Population stddev of the cumulative normed work.
    pub cumulative_std_dev: f64,
}

impl IntervalRecord {
    /// All interval rows of one aggregator. Empty when no specimen produced
    /// normed intervals.
    pub fn from_aggregator(aggregator: &SeriesAggregator) -> Vec<Self> {
        let cumulative = aggregator.cumulative_normed_work_statistics();
        if cumulative.is_empty() {
            return Vec::new();
        }
        let stats = aggregator.interval_statistics();
        cumulative
            .into_iter()
            .enumerate()
            .map(|(i, cum)| Self {
                series: aggregator.name().to_string(),
                position: i + 1,
                mean: stats.means[i],
                std_dev: stats.std_devs[i],
                relative_std_dev: stats.relative_std_devs[i],
                cumulative_mean: cum.mean,
                cumulative_std_dev: cum.std_dev,
            })
            .collect()
    }
}

/// Bootstrap confidence intervals for one feature of one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapRecord {
    /// Feature name.
    pub feature: String,
    /// Group (series) name.
    pub group: String,
    /// Number of bootstrap iterations behind the intervals.
    pub iterations: usize,
    /// Mean of the original data.
    pub original_mean: f64,
    /// Median of the original data.
    pub original_median: f64,
    /// Sample standard deviation of the original data.
    pub original_std: f64,
    /// 95% CI lower bound of the mean.
    pub ci95_lower: f64,
    /// 95% CI upper bound of the mean.
    pub ci95_upper: f64,
    /// 90% CI lower bound of the mean.
    pub ci90_lower: f64,
    /// 90% CI upper bound of the mean.
    pub ci90_upper: f64,
}

impl BootstrapRecord {
    /// Flatten one bootstrap result.
    pub fn from_result(feature: &str, group: &str, result: &BootstrapResult) -> Self {
        Self {
            feature: feature.to_string(),
            group: group.to_string(),
            iterations: result.means.len(),
            original_mean: result.original_mean,
            original_median: result.original_median,
            original_std: result.original_std,
            ci95_lower: result.ci_mean.lower,
            ci95_upper: result.ci_mean.upper,
            ci90_lower: result.ci_mean_90.lower,
            ci90_upper: result.ci_mean_90.upper,
        }
    }
}

/// One omnibus ANOVA row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnovaRecord {
    /// Feature name.
    pub feature: String,
    /// F statistic.
    pub f_statistic: f64,
    /// p-value of the omnibus test.
    pub p_value: f64,
    /// Whether the test was significant.
    pub significant: bool,
    /// Effect size η².
    pub eta_squared: f64,
    /// Shapiro-Wilk W on the residuals.
    pub shapiro_statistic: f64,
    /// Shapiro-Wilk p-value.
    pub shapiro_p: f64,
    /// Levene statistic across the original groups.
    pub levene_statistic: f64,
    /// Levene p-value.
    pub levene_p: f64,
    /// Group size after bootstrap expansion, if any.
    pub expanded_group_size: Option<usize>,
}

impl AnovaRecord {
    /// Flatten one ANOVA result.
    pub fn from_result(feature: &str, result: &AnovaResult) -> Self {
        Self {
            feature: feature.to_string(),
            f_statistic: result.f_statistic,
            p_value: result.p_value,
            significant: result.is_significant,
            eta_squared: result.eta_squared,
            shapiro_statistic: result.shapiro.statistic,
            shapiro_p: result.shapiro.p_value,
            levene_statistic: result.levene.statistic,
            levene_p: result.levene.p_value,
            expanded_group_size: result.expanded_group_size,
        }
    }
}

/// One Tukey HSD pairwise row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosthocRecord {
    /// Feature name.
    pub feature: String,
    /// First group of the pair.
    pub group_a: String,
    /// Second group of the pair.
    pub group_b: String,
    /// `mean(group_b) - mean(group_a)`.
    pub mean_difference: f64,
    /// Family-adjusted p-value.
    pub adjusted_p: f64,
    /// Whether the pair differs significantly.
    pub significant: bool,
}

impl PosthocRecord {
    /// All pairwise rows of one ANOVA result.
    pub fn from_result(feature: &str, result: &AnovaResult) -> Vec<Self> {
        result
            .tukey
            .iter()
            .map(|pair| Self {
                feature: feature.to_string(),
                group_a: pair.group_a.clone(),
                group_b: pair.group_b.clone(),
                mean_difference: pair.mean_difference,
                adjusted_p: pair.adjusted_p,
                significant: pair.reject,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfpo_core::{Curve, reduce_specimen};

    fn sample_features() -> SpecimenFeatures {
        let curve = Curve::from_pairs([
            (0.0, 0.0),
            (100.0, 0.1),
            (200.0, 0.2),
            (300.0, 0.15),
            (400.0, 0.05),
        ]);
        reduce_specimen(&curve, 6.0, 1000.0).unwrap()
    }

    #[test]
    fn test_specimen_record_flattening() {
        let record = SpecimenRecord::from_features("series-a", 0, &sample_features());
        assert_eq!(record.series, "series-a");
        assert!((record.max_force - 0.2).abs() < 1e-12);
        assert!((record.ifss - 26.53).abs() < 1e-9);
        assert!(record.ifss_valid);
        assert_eq!(record.work_intervals.len(), 10);
        assert!(record.normed_intervals.is_some());
    }

    #[test]
    fn test_series_feature_records_cover_all_features() {
        let mut aggregator = SeriesAggregator::new("series-a");
        aggregator.add(&sample_features());
        let records = SeriesFeatureRecord::from_aggregator(&aggregator);
        assert_eq!(records.len(), FeatureKind::ALL.len());
        assert!(records.iter().any(|r| r.feature == "ifss" && r.count == 1));
    }

    #[test]
    fn test_interval_records() {
        // Densely sampled ramp so every decile interval holds many points.
        let curve = Curve::from_pairs((0..=1000).map(|i| (i as f64, i as f64 / 1000.0)));
        let features = reduce_specimen(&curve, 6.0, 1000.0).unwrap();
        let mut aggregator = SeriesAggregator::new("series-a");
        aggregator.add(&features);

        let records = IntervalRecord::from_aggregator(&aggregator);
        assert_eq!(records.len(), 10);
        assert_eq!(records[0].position, 1);
        // Cumulative fraction reaches ~1 at the last decile.
        assert!((records[9].cumulative_mean - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_meta_schema_version() {
        let meta = ReportMeta::new(42);
        assert_eq!(meta.schema_version, SCHEMA_VERSION);
        assert_eq!(meta.seed, 42);
    }
}
