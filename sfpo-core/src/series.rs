//! Series Aggregation
//!
//! One `SeriesAggregator` owns all reduced specimens of one measurement
//! series and answers aggregate queries: per-feature means and standard
//! deviations, z-scores, and the normalized work-interval statistics used to
//! characterize how quickly pull-out work accumulates along the embedding
//! length.
//!
//! Means and stddevs are population statistics (ddof = 0) over the *valid*
//! values of a feature; invalid sentinels stay visible to exporters but are
//! excluded here so degenerate specimens cannot drag aggregate numbers
//! toward zero.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::features::{FeatureKind, FeatureValue, SpecimenFeatures, UnknownFeatureError};
use crate::{WORK_INTERVAL_COUNT, round_to};

/// Classical and robust z-scores for one feature of one series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZScoreResult {
    /// `(x - mean) / std`, zeros when the std is zero.
    pub z_scores: Vec<f64>,
    /// `(x - median) / (IQR / 1.349)`, zeros when the scale is zero.
    pub robust_z_scores: Vec<f64>,
    /// Population mean of the valid values.
    pub mean: f64,
    /// Population standard deviation of the valid values.
    pub std_dev: f64,
    /// Median of the valid values.
    pub median: f64,
    /// Interquartile range of the valid values.
    pub iqr: f64,
}

/// Per-position statistics over all specimens' normed intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalStatistics {
    /// Mean normed work per decile position (3 decimals).
    pub means: [f64; WORK_INTERVAL_COUNT],
    /// Population stddev per decile position (3 decimals).
    pub std_devs: [f64; WORK_INTERVAL_COUNT],
    /// `std_dev / mean` per position, 0 where the mean is 0 (4 decimals).
    pub relative_std_devs: [f64; WORK_INTERVAL_COUNT],
}

/// Mean and stddev of the cumulative normed work at one decile cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeWorkStat {
    /// Cutoff label, `"10%"` through `"100%"`.
    pub label: String,
    /// Mean cumulative fraction across specimens (4 decimals).
    pub mean: f64,
    /// Population stddev across specimens (4 decimals).
    pub std_dev: f64,
}

/// Growing collection of reduced specimens for one named series.
#[derive(Debug, Clone, Default)]
pub struct SeriesAggregator {
    name: String,
    max_forces: Vec<FeatureValue>,
    embedding_lengths: Vec<FeatureValue>,
    fiber_diameters: Vec<FeatureValue>,
    ifss_values: Vec<FeatureValue>,
    works: Vec<FeatureValue>,
    force_moduli: Vec<FeatureValue>,
    works_before_fmax: Vec<FeatureValue>,
    works_after_fmax: Vec<FeatureValue>,
    area_normalized_works: Vec<FeatureValue>,
    work_intervals: Vec<[f64; WORK_INTERVAL_COUNT]>,
    normed_intervals: Vec<[f64; WORK_INTERVAL_COUNT]>,
}

impl SeriesAggregator {
    /// Create an empty aggregator for the named series.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The series name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of specimens added so far.
    pub fn len(&self) -> usize {
        self.max_forces.len()
    }

    /// Whether no specimen has been added yet.
    pub fn is_empty(&self) -> bool {
        self.max_forces.is_empty()
    }

    /// Append one specimen's features to every backing sequence.
    pub fn add(&mut self, features: &SpecimenFeatures) {
        for kind in FeatureKind::ALL {
            let value = features.feature(kind);
            self.backing_mut(kind).push(value);
        }
        self.work_intervals.push(features.work_intervals);
        if let Some(normed) = features.normed_intervals {
            self.normed_intervals.push(normed);
        }
    }

    fn backing(&self, kind: FeatureKind) -> &[FeatureValue] {
        match kind {
            FeatureKind::MaxForce => &self.max_forces,
            FeatureKind::EmbeddingLength => &self.embedding_lengths,
            FeatureKind::FiberDiameter => &self.fiber_diameters,
            FeatureKind::Ifss => &self.ifss_values,
            FeatureKind::Work => &self.works,
            FeatureKind::ForceModulus => &self.force_moduli,
            FeatureKind::WorkBeforeFmax => &self.works_before_fmax,
            FeatureKind::WorkAfterFmax => &self.works_after_fmax,
            FeatureKind::AreaNormalizedWork => &self.area_normalized_works,
        }
    }

    fn backing_mut(&mut self, kind: FeatureKind) -> &mut Vec<FeatureValue> {
        match kind {
            FeatureKind::MaxForce => &mut self.max_forces,
            FeatureKind::EmbeddingLength => &mut self.embedding_lengths,
            FeatureKind::FiberDiameter => &mut self.fiber_diameters,
            FeatureKind::Ifss => &mut self.ifss_values,
            FeatureKind::Work => &mut self.works,
            FeatureKind::ForceModulus => &mut self.force_moduli,
            FeatureKind::WorkBeforeFmax => &mut self.works_before_fmax,
            FeatureKind::WorkAfterFmax => &mut self.works_after_fmax,
            FeatureKind::AreaNormalizedWork => &mut self.area_normalized_works,
        }
    }

    /// All recorded values for a feature, sentinels included.
    pub fn values(&self, kind: FeatureKind) -> &[FeatureValue] {
        self.backing(kind)
    }

    /// The valid values of a feature, in insertion order.
    pub fn valid_values(&self, kind: FeatureKind) -> Vec<f64> {
        self.backing(kind)
            .iter()
            .filter(|v| v.valid)
            .map(|v| v.value)
            .collect()
    }

    /// Per-specimen work intervals recorded so far.
    pub fn work_interval_rows(&self) -> &[[f64; WORK_INTERVAL_COUNT]] {
        &self.work_intervals
    }

    /// Per-specimen normed intervals (zero-work specimens excluded).
    pub fn normed_interval_rows(&self) -> &[[f64; WORK_INTERVAL_COUNT]] {
        &self.normed_intervals
    }

    /// Population mean of the feature's valid values; 0.0 (logged) when the
    /// series has no valid data yet.
    pub fn mean(&self, kind: FeatureKind) -> f64 {
        let values = self.valid_values(kind);
        if values.is_empty() {
            warn!(series = %self.name, feature = %kind, "no valid data for mean");
            return 0.0;
        }
        mean_of(&values)
    }

    /// Population standard deviation (ddof = 0) of the feature's valid
    /// values; 0.0 (logged) when the series has no valid data yet.
    pub fn stddev(&self, kind: FeatureKind) -> f64 {
        let values = self.valid_values(kind);
        if values.is_empty() {
            warn!(series = %self.name, feature = %kind, "no valid data for stddev");
            return 0.0;
        }
        population_std(&values)
    }

    /// `mean` looked up by feature name.
    pub fn mean_of(&self, feature_name: &str) -> Result<f64, UnknownFeatureError> {
        Ok(self.mean(feature_name.parse()?))
    }

    /// `stddev` looked up by feature name.
    pub fn stddev_of(&self, feature_name: &str) -> Result<f64, UnknownFeatureError> {
        Ok(self.stddev(feature_name.parse()?))
    }

    /// Per-position mean/stddev/relative-stddev across all specimens' normed
    /// intervals. All-zero when no specimen produced normed intervals.
    pub fn interval_statistics(&self) -> IntervalStatistics {
        let mut stats = IntervalStatistics {
            means: [0.0; WORK_INTERVAL_COUNT],
            std_devs: [0.0; WORK_INTERVAL_COUNT],
            relative_std_devs: [0.0; WORK_INTERVAL_COUNT],
        };
        if self.normed_intervals.is_empty() {
            warn!(series = %self.name, "no normed intervals for interval statistics");
            return stats;
        }

        for position in 0..WORK_INTERVAL_COUNT {
            let column: Vec<f64> = self
                .normed_intervals
                .iter()
                .map(|row| row[position])
                .collect();
            let mean = mean_of(&column);
            let std_dev = population_std(&column);
            stats.means[position] = round_to(mean, 3);
            stats.std_devs[position] = round_to(std_dev, 3);
            stats.relative_std_devs[position] = if mean == 0.0 {
                0.0
            } else {
                round_to(std_dev / mean, 4)
            };
        }
        stats
    }

    /// Mean and stddev of the cumulative normed work at each decile cutoff,
    /// labeled `"10%"` through `"100%"`.
    pub fn cumulative_normed_work_statistics(&self) -> Vec<CumulativeWorkStat> {
        if self.normed_intervals.is_empty() {
            warn!(series = %self.name, "no normed intervals for cumulative statistics");
            return Vec::new();
        }

        (1..=WORK_INTERVAL_COUNT)
            .map(|position| {
                let sums: Vec<f64> = self
                    .normed_intervals
                    .iter()
                    .map(|row| row[..position].iter().sum())
                    .collect();
                CumulativeWorkStat {
                    label: format!("{}%", position * 10),
                    mean: round_to(mean_of(&sums), 4),
                    std_dev: round_to(population_std(&sums), 4),
                }
            })
            .collect()
    }

    /// Classical and robust z-scores over the feature's valid values.
    ///
    /// Requires at least two data points; otherwise returns the all-zero
    /// result (logged) so plotting degrades gracefully.
    pub fn z_scores(&self, kind: FeatureKind) -> ZScoreResult {
        let values = self.valid_values(kind);
        if values.len() < 2 {
            warn!(
                series = %self.name,
                feature = %kind,
                count = values.len(),
                "too few data points for z-scores"
            );
            return ZScoreResult {
                z_scores: vec![0.0; values.len()],
                robust_z_scores: vec![0.0; values.len()],
                ..ZScoreResult::default()
            };
        }

        let mean = mean_of(&values);
        let std_dev = population_std(&values);
        let median = percentile(&values, 50.0);
        let iqr = percentile(&values, 75.0) - percentile(&values, 25.0);
        let robust_scale = iqr / 1.349;

        let z_scores = if std_dev == 0.0 {
            vec![0.0; values.len()]
        } else {
            values.iter().map(|x| (x - mean) / std_dev).collect()
        };
        let robust_z_scores = if robust_scale == 0.0 {
            vec![0.0; values.len()]
        } else {
            values.iter().map(|x| (x - median) / robust_scale).collect()
        };

        ZScoreResult {
            z_scores,
            robust_z_scores,
            mean,
            std_dev,
            median,
            iqr,
        }
    }
}

fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0).
fn population_std(values: &[f64]) -> f64 {
    let mean = mean_of(values);
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentile with linear interpolation between nearest ranks.
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = pct / 100.0 * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let fraction = rank - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}
