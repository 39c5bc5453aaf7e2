//! Tukey HSD Post-Hoc Comparison
//!
//! Pairwise comparison of group means after a significant omnibus ANOVA,
//! with p-values adjusted through the studentized range distribution
//! (Tukey-Kramer form for unequal group sizes).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anova::Group;
use crate::distribution::studentized_range_cdf;

/// One pairwise comparison of the post-hoc table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TukeyComparison {
    /// First group of the pair (lexicographically smaller name).
    pub group_a: String,
    /// Second group of the pair.
    pub group_b: String,
    /// `mean(group_b) - mean(group_a)`.
    pub mean_difference: f64,
    /// p-value adjusted for the family of pairwise comparisons.
    pub adjusted_p: f64,
    /// Whether the pair differs significantly at the given alpha.
    pub reject: bool,
}

/// Tukey HSD over every unordered group pair.
///
/// `mse` and `df_error` come from the fitted one-way model. Pairs are
/// enumerated in lexicographic name order, so the table is identical no
/// matter how the groups were supplied, and the (A,B) row answers for (B,A)
/// as well.
pub fn tukey_hsd(groups: &[Group], mse: f64, df_error: f64, alpha: f64) -> Vec<TukeyComparison> {
    let mut sorted: Vec<&Group> = groups.iter().filter(|g| !g.values.is_empty()).collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let k = sorted.len();
    let means: Vec<f64> = sorted
        .iter()
        .map(|g| g.values.iter().sum::<f64>() / g.values.len() as f64)
        .collect();

    let mut comparisons = Vec::with_capacity(k.saturating_sub(1) * k / 2);
    for i in 0..k {
        for j in (i + 1)..k {
            let mean_difference = means[j] - means[i];
            let n_i = sorted[i].values.len() as f64;
            let n_j = sorted[j].values.len() as f64;
            let standard_error = (mse / 2.0 * (1.0 / n_i + 1.0 / n_j)).sqrt();

            let adjusted_p = if standard_error == 0.0 {
                // Degenerate pooled variance: identical means are a certain
                // non-difference, anything else a certain difference.
                if mean_difference == 0.0 { 1.0 } else { 0.0 }
            } else {
                let q = mean_difference.abs() / standard_error;
                (1.0 - studentized_range_cdf(q, k, df_error)).clamp(0.0, 1.0)
            };

            debug!(
                group_a = %sorted[i].name,
                group_b = %sorted[j].name,
                adjusted_p,
                "tukey pair"
            );
            comparisons.push(TukeyComparison {
                group_a: sorted[i].name.clone(),
                group_b: sorted[j].name.clone(),
                mean_difference,
                adjusted_p,
                reject: adjusted_p < alpha,
            });
        }
    }
    comparisons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![
            Group::new("A", vec![1.0, 2.0, 3.0]),
            Group::new("B", vec![1.0, 2.0, 3.0]),
            Group::new("C", vec![10.0, 11.0, 12.0]),
        ]
    }

    // MSE and dof of the fitted one-way model for the fixture above.
    const MSE: f64 = 1.0;
    const DF_ERROR: f64 = 6.0;

    #[test]
    fn test_pairwise_table() {
        let table = tukey_hsd(&groups(), MSE, DF_ERROR, 0.05);
        assert_eq!(table.len(), 3);

        let ab = &table[0];
        assert_eq!((ab.group_a.as_str(), ab.group_b.as_str()), ("A", "B"));
        assert!((ab.mean_difference - 0.0).abs() < 1e-12);
        assert!(!ab.reject);

        let ac = &table[1];
        assert_eq!((ac.group_a.as_str(), ac.group_b.as_str()), ("A", "C"));
        assert!((ac.mean_difference - 9.0).abs() < 1e-12);
        assert!(ac.adjusted_p < 0.01);
        assert!(ac.reject);

        let bc = &table[2];
        assert!((bc.mean_difference - 9.0).abs() < 1e-12);
        assert!(bc.reject);
    }

    #[test]
    fn test_table_is_symmetric_in_group_order() {
        let mut reversed = groups();
        reversed.reverse();
        let forward = tukey_hsd(&groups(), MSE, DF_ERROR, 0.05);
        let backward = tukey_hsd(&reversed, MSE, DF_ERROR, 0.05);

        assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.iter().zip(&backward) {
            assert_eq!(f.group_a, b.group_a);
            assert_eq!(f.group_b, b.group_b);
            assert!((f.mean_difference.abs() - b.mean_difference.abs()).abs() < 1e-12);
            assert_eq!(f.reject, b.reject);
        }
    }

    #[test]
    fn test_zero_standard_error() {
        let identical = vec![
            Group::new("A", vec![5.0, 5.0]),
            Group::new("B", vec![5.0, 5.0]),
            Group::new("C", vec![6.0, 6.0]),
        ];
        let table = tukey_hsd(&identical, 0.0, 3.0, 0.05);
        assert!((table[0].adjusted_p - 1.0).abs() < f64::EPSILON); // A vs B
        assert!((table[1].adjusted_p - 0.0).abs() < f64::EPSILON); // A vs C
    }
}
