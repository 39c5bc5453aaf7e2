//! Study Orchestration
//!
//! Sequences the engine for a batch of measurement series: reduce every
//! curve, aggregate per series, then run bootstrap confidence intervals and
//! the cross-series ANOVA per feature. Degenerate members are logged and
//! skipped; a study over many series completes even when individual
//! specimens or features are unusable.

use std::collections::BTreeMap;

use tracing::{info, warn};

use sfpo_core::{Curve, FeatureKind, SeriesAggregator, SpecimenFeatures, reduce_specimen};
use sfpo_report::{
    AnovaRecord, BootstrapRecord, IntervalRecord, PosthocRecord, Report, ReportMeta,
    SeriesFeatureRecord, SpecimenRecord,
};
use sfpo_stats::{AnovaResult, BootstrapResult, Group, compare_groups, resample};

use crate::config::AnalysisConfig;

/// The features a study compares across series by default: the trio the
/// historical pipeline exported (peak force, work, IFSS).
pub const DEFAULT_STUDY_FEATURES: [FeatureKind; 3] =
    [FeatureKind::MaxForce, FeatureKind::Work, FeatureKind::Ifss];

/// One reduced measurement series: the aggregator plus the per-specimen
/// features that fed it.
#[derive(Debug, Clone)]
pub struct AnalyzedSeries {
    /// Per-series aggregate state.
    pub aggregator: SeriesAggregator,
    /// The reduced specimens, in ingestion order.
    pub specimens: Vec<SpecimenFeatures>,
}

impl AnalyzedSeries {
    /// The series name.
    pub fn name(&self) -> &str {
        self.aggregator.name()
    }
}

/// Inference results of one study, keyed by feature name for deterministic
/// iteration.
#[derive(Debug, Clone, Default)]
pub struct StudyResult {
    /// Bootstrap results per feature, as (group name, result) pairs.
    pub bootstrap: BTreeMap<String, Vec<(String, BootstrapResult)>>,
    /// Completed ANOVA results per feature.
    pub anova: BTreeMap<String, AnovaResult>,
    /// Features for which the ANOVA was skipped (fewer than two populated
    /// groups, or too little data); reasons are logged.
    pub anova_skipped: Vec<String>,
}

/// Reduce one series of (curve, fiber diameter) pairs.
///
/// Specimens whose curves are empty are logged and skipped; the series
/// continues with the remaining specimens. An all-degenerate series yields
/// an empty aggregator, which the caller may treat as an abort condition.
pub fn reduce_series(
    name: &str,
    specimens: &[(Curve, f64)],
    config: &AnalysisConfig,
) -> AnalyzedSeries {
    let mut aggregator = SeriesAggregator::new(name);
    let mut reduced = Vec::with_capacity(specimens.len());

    for (index, (curve, fiber_diameter)) in specimens.iter().enumerate() {
        match reduce_specimen(curve, *fiber_diameter, config.max_embedding_length) {
            Ok(features) => {
                aggregator.add(&features);
                reduced.push(features);
            }
            Err(err) => {
                warn!(series = name, specimen = index, %err, "skipping specimen");
            }
        }
    }

    info!(
        series = name,
        specimens = reduced.len(),
        skipped = specimens.len() - reduced.len(),
        "reduced series"
    );
    AnalyzedSeries {
        aggregator,
        specimens: reduced,
    }
}

/// Pull one feature's valid values out of every series as named groups.
///
/// Invalid sentinels never reach inference; series without a single valid
/// value produce an empty group (dropped downstream with a log line).
pub fn extract_feature_groups(series: &[AnalyzedSeries], kind: FeatureKind) -> Vec<Group> {
    series
        .iter()
        .map(|s| Group::new(s.name(), s.aggregator.valid_values(kind)))
        .collect()
}

/// Run bootstrap and ANOVA for the given features across all series.
pub fn run_study(
    series: &[AnalyzedSeries],
    features: &[FeatureKind],
    config: &AnalysisConfig,
) -> StudyResult {
    let mut result = StudyResult::default();
    let bootstrap_config = config.bootstrap_config();
    let anova_config = config.anova_config();

    for &kind in features {
        let groups = extract_feature_groups(series, kind);

        if config.perform_bootstrap {
            let mut entries = Vec::new();
            for group in &groups {
                if group.values.is_empty() {
                    warn!(feature = %kind, group = %group.name, "no data for bootstrap");
                    continue;
                }
                entries.push((group.name.clone(), resample(&group.values, &bootstrap_config)));
            }
            if !entries.is_empty() {
                result.bootstrap.insert(kind.as_str().to_string(), entries);
            }
        }

        if config.perform_anova {
            match compare_groups(&groups, &anova_config) {
                Ok(anova) => {
                    result.anova.insert(kind.as_str().to_string(), anova);
                }
                Err(err) => {
                    warn!(feature = %kind, %err, "skipping ANOVA");
                    result.anova_skipped.push(kind.as_str().to_string());
                }
            }
        }
    }

    info!(
        bootstrapped = result.bootstrap.len(),
        compared = result.anova.len(),
        skipped = result.anova_skipped.len(),
        "study complete"
    );
    result
}

/// Flatten the study into the exportable report.
pub fn build_report(
    series: &[AnalyzedSeries],
    study: &StudyResult,
    config: &AnalysisConfig,
) -> Report {
    let mut report = Report::new(ReportMeta::new(config.seed));

    for s in series {
        for (index, features) in s.specimens.iter().enumerate() {
            report
                .specimens
                .push(SpecimenRecord::from_features(s.name(), index, features));
        }
        report
            .series_features
            .extend(SeriesFeatureRecord::from_aggregator(&s.aggregator));
        report
            .intervals
            .extend(IntervalRecord::from_aggregator(&s.aggregator));
    }

    for (feature, entries) in &study.bootstrap {
        for (group, result) in entries {
            report
                .bootstrap
                .push(BootstrapRecord::from_result(feature, group, result));
        }
    }
    for (feature, anova) in &study.anova {
        report.anova.push(AnovaRecord::from_result(feature, anova));
        report.posthoc.extend(PosthocRecord::from_result(feature, anova));
    }

    report
}
