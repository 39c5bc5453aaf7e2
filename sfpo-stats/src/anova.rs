//! One-Way ANOVA
//!
//! Compares a feature across named measurement series: optional bootstrap
//! expansion to a common group size, the F test, assumption diagnostics
//! (Shapiro-Wilk on residuals, Levene across the original groups), the
//! eta-squared effect size and - when the omnibus test is significant with
//! more than two groups - the Tukey HSD post-hoc table.
//!
//! Non-significant results and failed diagnostics are normal data. Only
//! structural misuse (fewer than two usable groups, no residual degrees of
//! freedom) produces an error, so batch pipelines can skip a feature and
//! continue.

use thiserror::Error;
use tracing::{info, warn};

use crate::DEFAULT_ALPHA;
use crate::bootstrap::{BootstrapConfig, expand_for_anova};
use crate::diagnostics::{TestStatistic, levene, shapiro_wilk};
use crate::distribution::f_survival;
use crate::tukey::{TukeyComparison, tukey_hsd};

/// One named group of feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Group (series) name.
    pub name: String,
    /// The feature values of this group.
    pub values: Vec<f64>,
}

impl Group {
    /// Create a named group.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Configuration for one group comparison.
#[derive(Debug, Clone)]
pub struct AnovaConfig {
    /// Bootstrap-expand every group to this size before the F test.
    /// `None` analyzes the raw groups.
    pub expand_to: Option<usize>,
    /// Significance level for the omnibus and post-hoc decisions.
    pub alpha: f64,
    /// Bootstrap settings used for expansion.
    pub bootstrap: BootstrapConfig,
}

impl Default for AnovaConfig {
    fn default() -> Self {
        Self {
            expand_to: None,
            alpha: DEFAULT_ALPHA,
            bootstrap: BootstrapConfig::default(),
        }
    }
}

/// Errors from group comparison.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnovaError {
    /// Fewer than two non-empty groups were supplied.
    #[error("ANOVA requires at least 2 non-empty groups, got {provided}")]
    InsufficientGroups {
        /// Number of non-empty groups after filtering.
        provided: usize,
    },
    /// No residual degrees of freedom remain (too few values overall).
    #[error("not enough values across groups for ANOVA")]
    InsufficientData,
}

/// Result of comparing one feature across groups.
#[derive(Debug, Clone)]
pub struct AnovaResult {
    /// The F statistic.
    pub f_statistic: f64,
    /// p-value of the omnibus test.
    pub p_value: f64,
    /// Whether `p_value < alpha`.
    pub is_significant: bool,
    /// Effect size `(SST - SSE) / SST`.
    pub eta_squared: f64,
    /// Shapiro-Wilk normality test on the model residuals.
    pub shapiro: TestStatistic,
    /// Levene variance-homogeneity test across the original (non-expanded)
    /// groups.
    pub levene: TestStatistic,
    /// Tukey HSD pairwise table; empty when the omnibus test was not
    /// significant or only two groups were compared.
    pub tukey: Vec<TukeyComparison>,
    /// Names of the compared groups, sorted.
    pub group_names: Vec<String>,
    /// Group size after bootstrap expansion, if expansion ran.
    pub expanded_group_size: Option<usize>,
}

/// One-way ANOVA decomposition of grouped values.
pub(crate) struct OneWayFit {
    pub f: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub mse: f64,
    pub sst: f64,
    pub sse: f64,
    pub residuals: Vec<f64>,
}

/// Fit `value ~ group`. `None` when fewer than two non-empty groups or no
/// residual degrees of freedom remain.
pub(crate) fn fit_one_way(groups: &[Vec<f64>]) -> Option<OneWayFit> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.is_empty()) {
        return None;
    }
    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if n_total <= k {
        return None;
    }
    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;

    let grand_mean =
        groups.iter().flatten().sum::<f64>() / n_total as f64;

    let mut ssb = 0.0;
    let mut sse = 0.0;
    let mut residuals = Vec::with_capacity(n_total);
    for group in groups {
        let mean = group.iter().sum::<f64>() / group.len() as f64;
        ssb += group.len() as f64 * (mean - grand_mean).powi(2);
        for value in group {
            residuals.push(value - mean);
            sse += (value - mean).powi(2);
        }
    }
    let sst = ssb + sse;

    let msb = ssb / df_between;
    let mse = sse / df_within;
    let f = if mse == 0.0 {
        if msb == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        msb / mse
    };

    Some(OneWayFit {
        f,
        df_between,
        df_within,
        mse,
        sst,
        sse,
        residuals,
    })
}

/// Compare a feature across at least two named groups.
///
/// Empty groups are dropped (logged). Groups are sorted by name before the
/// fit, so the result is invariant to the order in which they are supplied.
pub fn compare_groups(groups: &[Group], config: &AnovaConfig) -> Result<AnovaResult, AnovaError> {
    let mut usable: Vec<&Group> = groups
        .iter()
        .filter(|g| {
            if g.values.is_empty() {
                warn!(group = %g.name, "dropping empty group from ANOVA");
                false
            } else {
                true
            }
        })
        .collect();
    if usable.len() < 2 {
        return Err(AnovaError::InsufficientGroups {
            provided: usable.len(),
        });
    }
    usable.sort_by(|a, b| a.name.cmp(&b.name));

    let group_names: Vec<String> = usable.iter().map(|g| g.name.clone()).collect();

    // Optional size equalization; each group gets its own seed stream so the
    // expansion stays deterministic after the sort.
    let analyzed: Vec<Group> = match config.expand_to {
        Some(target) => usable
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let cfg = BootstrapConfig {
                    seed: config.bootstrap.seed.wrapping_add(i as u64),
                    ..config.bootstrap.clone()
                };
                Group::new(g.name.clone(), expand_for_anova(&g.values, target, &cfg))
            })
            .collect(),
        None => usable.iter().map(|&g| g.clone()).collect(),
    };

    let value_groups: Vec<Vec<f64>> = analyzed.iter().map(|g| g.values.clone()).collect();
    let fit = fit_one_way(&value_groups).ok_or(AnovaError::InsufficientData)?;

    let (p_value, eta_squared) = if fit.sst == 0.0 {
        warn!("zero total variance across groups");
        (1.0, 0.0)
    } else {
        (
            f_survival(fit.f, fit.df_between, fit.df_within),
            (fit.sst - fit.sse) / fit.sst,
        )
    };
    let is_significant = p_value < config.alpha;

    let shapiro = shapiro_wilk(&fit.residuals);
    let original_values: Vec<Vec<f64>> = usable.iter().map(|g| g.values.clone()).collect();
    let levene = levene(&original_values);

    let tukey = if is_significant && analyzed.len() > 2 {
        info!(groups = analyzed.len(), "significant ANOVA, running Tukey HSD");
        tukey_hsd(&analyzed, fit.mse, fit.df_within, config.alpha)
    } else {
        Vec::new()
    };

    Ok(AnovaResult {
        f_statistic: fit.f,
        p_value,
        is_significant,
        eta_squared,
        shapiro,
        levene,
        tukey,
        group_names,
        expanded_group_size: config.expand_to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc_groups() -> Vec<Group> {
        vec![
            Group::new("A", vec![1.0, 2.0, 3.0]),
            Group::new("B", vec![1.0, 2.0, 3.0]),
            Group::new("C", vec![10.0, 11.0, 12.0]),
        ]
    }

    #[test]
    fn test_reference_three_group_scenario() {
        let result = compare_groups(&abc_groups(), &AnovaConfig::default()).unwrap();

        assert!((result.f_statistic - 81.0).abs() < 1e-9);
        assert!(result.p_value < 0.05);
        assert!(result.is_significant);
        assert!(result.eta_squared > 0.9);
        assert_eq!(result.tukey.len(), 3);

        for pair in &result.tukey {
            let involves_c = pair.group_a == "C" || pair.group_b == "C";
            assert_eq!(pair.reject, involves_c, "{} vs {}", pair.group_a, pair.group_b);
        }
    }

    #[test]
    fn test_f_invariant_to_group_order() {
        let mut reversed = abc_groups();
        reversed.reverse();
        let a = compare_groups(&abc_groups(), &AnovaConfig::default()).unwrap();
        let b = compare_groups(&reversed, &AnovaConfig::default()).unwrap();
        assert!((a.f_statistic - b.f_statistic).abs() < 1e-12);
        assert_eq!(a.group_names, b.group_names);
    }

    #[test]
    fn test_two_identical_groups_not_significant() {
        let groups = vec![
            Group::new("A", vec![1.0, 2.0, 3.0, 4.0]),
            Group::new("B", vec![1.0, 2.0, 3.0, 4.0]),
        ];
        let result = compare_groups(&groups, &AnovaConfig::default()).unwrap();
        assert!((result.f_statistic - 0.0).abs() < 1e-12);
        assert!(!result.is_significant);
        assert!(result.tukey.is_empty());
    }

    #[test]
    fn test_insufficient_groups() {
        let one = vec![Group::new("A", vec![1.0, 2.0])];
        assert!(matches!(
            compare_groups(&one, &AnovaConfig::default()),
            Err(AnovaError::InsufficientGroups { provided: 1 })
        ));

        let with_empty = vec![
            Group::new("A", vec![1.0, 2.0]),
            Group::new("B", vec![]),
        ];
        assert!(matches!(
            compare_groups(&with_empty, &AnovaConfig::default()),
            Err(AnovaError::InsufficientGroups { provided: 1 })
        ));
    }

    #[test]
    fn test_empty_group_dropped_but_comparison_continues() {
        let groups = vec![
            Group::new("A", vec![1.0, 2.0, 3.0]),
            Group::new("B", vec![]),
            Group::new("C", vec![10.0, 11.0, 12.0]),
        ];
        let result = compare_groups(&groups, &AnovaConfig::default()).unwrap();
        assert_eq!(result.group_names, vec!["A", "C"]);
        assert!(result.is_significant);
        // Only two groups remain: no post-hoc table.
        assert!(result.tukey.is_empty());
    }

    #[test]
    fn test_zero_variance_groups() {
        let groups = vec![
            Group::new("A", vec![5.0, 5.0, 5.0]),
            Group::new("B", vec![5.0, 5.0, 5.0]),
        ];
        let result = compare_groups(&groups, &AnovaConfig::default()).unwrap();
        assert!((result.f_statistic - 0.0).abs() < f64::EPSILON);
        assert!((result.p_value - 1.0).abs() < f64::EPSILON);
        assert!(!result.is_significant);
    }

    #[test]
    fn test_bootstrap_expansion_path() {
        let groups = vec![
            Group::new("low", vec![1.0, 2.0]),
            Group::new("high", vec![10.0, 11.0]),
        ];
        let config = AnovaConfig {
            expand_to: Some(10),
            ..AnovaConfig::default()
        };
        let result = compare_groups(&groups, &config).unwrap();
        assert_eq!(result.expanded_group_size, Some(10));
        // 2 groups × 10 values → 18 residual dof; separation is large.
        assert!(result.is_significant);
        assert!(!result.shapiro.p_value.is_nan());
    }

    #[test]
    fn test_single_value_groups_lack_degrees_of_freedom() {
        let groups = vec![
            Group::new("A", vec![1.0]),
            Group::new("B", vec![2.0]),
        ];
        assert!(matches!(
            compare_groups(&groups, &AnovaConfig::default()),
            Err(AnovaError::InsufficientData)
        ));
    }
}
