//! Assumption Diagnostics
//!
//! Normality (Shapiro-Wilk) and variance homogeneity (Levene) tests backing
//! the ANOVA result. Failing a diagnostic is data about the data, never an
//! engine error: both tests always return a statistic/p pair, degrading to
//! NaN only on structurally unusable input.

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::warn;

use crate::anova::fit_one_way;
use crate::distribution::f_survival;
use crate::percentile::percentile;

/// A test statistic with its p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestStatistic {
    /// The statistic (W for Shapiro-Wilk and Levene).
    pub statistic: f64,
    /// The p-value under the test's null hypothesis.
    pub p_value: f64,
}

impl TestStatistic {
    pub(crate) fn nan() -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
        }
    }
}

/// Polynomial tail correction for the largest Shapiro-Wilk weight
/// (Royston 1995, applied to 1/√n).
const WEIGHT_POLY_N: [f64; 6] = [-2.706056, 4.434685, -2.071190, -0.147981, 0.221157, 0.0];
/// Correction for the second-largest weight.
const WEIGHT_POLY_N1: [f64; 6] = [-3.582633, 5.682633, -1.752461, -0.293762, 0.042981, 0.0];

/// Evaluate a polynomial with coefficients from the highest power down.
fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}

fn std_normal() -> Normal {
    Normal::new(0.0, 1.0).unwrap()
}

/// Shapiro-Wilk normality test (Royston's AS R94 approximation).
///
/// Valid for 3 <= n <= 5000. Returns NaN for fewer than 3 points; zero-range
/// input yields W = 1, p = 1 (logged), since a constant sample carries no
/// evidence against normality that this test can use.
pub fn shapiro_wilk(data: &[f64]) -> TestStatistic {
    let n = data.len();
    if n < 3 {
        warn!(n, "too few points for Shapiro-Wilk");
        return TestStatistic::nan();
    }
    if n > 5000 {
        warn!(n, "Shapiro-Wilk p-value approximation beyond its validated range");
    }

    let mut x = data.to_vec();
    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    if ss < 1e-300 {
        warn!("zero-range input for Shapiro-Wilk");
        return TestStatistic {
            statistic: 1.0,
            p_value: 1.0,
        };
    }

    let normal = std_normal();
    let nf = n as f64;
    let m: Vec<f64> = (1..=n)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let m2: f64 = m.iter().map(|v| v * v).sum();

    let mut a = vec![0.0; n];
    if n == 3 {
        a[2] = std::f64::consts::FRAC_1_SQRT_2;
        a[0] = -a[2];
    } else {
        let rsn = 1.0 / nf.sqrt();
        let a_n = m[n - 1] / m2.sqrt() + polyval(&WEIGHT_POLY_N, rsn);
        if n <= 5 {
            let phi = (m2 - 2.0 * m[n - 1].powi(2)) / (1.0 - 2.0 * a_n * a_n);
            a[n - 1] = a_n;
            a[0] = -a_n;
            for i in 1..n - 1 {
                a[i] = m[i] / phi.sqrt();
            }
        } else {
            let a_n1 = m[n - 2] / m2.sqrt() + polyval(&WEIGHT_POLY_N1, rsn);
            let phi = (m2 - 2.0 * m[n - 1].powi(2) - 2.0 * m[n - 2].powi(2))
                / (1.0 - 2.0 * a_n * a_n - 2.0 * a_n1 * a_n1);
            a[n - 1] = a_n;
            a[0] = -a_n;
            a[n - 2] = a_n1;
            a[1] = -a_n1;
            for i in 2..n - 2 {
                a[i] = m[i] / phi.sqrt();
            }
        }
    }

    let numerator: f64 = a.iter().zip(&x).map(|(ai, xi)| ai * xi).sum::<f64>();
    let w = (numerator * numerator / ss).min(1.0);

    TestStatistic {
        statistic: w,
        p_value: shapiro_p_value(w, n),
    }
}

/// Royston's normalizing transformation of W to a p-value.
fn shapiro_p_value(w: f64, n: usize) -> f64 {
    let normal = std_normal();
    let nf = n as f64;
    match n {
        3 => {
            let p = 6.0 / std::f64::consts::PI
                * (w.sqrt().asin() - (0.75f64).sqrt().asin());
            p.clamp(0.0, 1.0)
        }
        4..=11 => {
            let gamma = -2.273 + 0.459 * nf;
            let shifted = gamma - (1.0 - w).ln();
            if shifted <= 0.0 {
                return 0.0;
            }
            let mu = 0.5440 - 0.39978 * nf + 0.025054 * nf * nf - 0.0006714 * nf.powi(3);
            let sigma =
                (1.3822 - 0.77857 * nf + 0.062767 * nf * nf - 0.0020322 * nf.powi(3)).exp();
            let z = (-shifted.ln() - mu) / sigma;
            (1.0 - normal.cdf(z)).clamp(0.0, 1.0)
        }
        _ => {
            let ln_n = nf.ln();
            let mu = -1.5861 - 0.31082 * ln_n - 0.083751 * ln_n * ln_n + 0.0038915 * ln_n.powi(3);
            let sigma = (-0.4803 - 0.082676 * ln_n + 0.0030302 * ln_n * ln_n).exp();
            let z = ((1.0 - w).ln() - mu) / sigma;
            (1.0 - normal.cdf(z)).clamp(0.0, 1.0)
        }
    }
}

/// Levene's test for variance homogeneity, median-centered
/// (Brown-Forsythe), matching the defaults of the historical pipeline.
///
/// One-way ANOVA on absolute deviations from the group medians. Returns NaN
/// (logged) when fewer than 2 non-empty groups or no residual degrees of
/// freedom remain.
pub fn levene(groups: &[Vec<f64>]) -> TestStatistic {
    let usable: Vec<&Vec<f64>> = groups.iter().filter(|g| !g.is_empty()).collect();
    if usable.len() < 2 {
        warn!(groups = groups.len(), "too few non-empty groups for Levene");
        return TestStatistic::nan();
    }

    let deviations: Vec<Vec<f64>> = usable
        .iter()
        .map(|g| {
            let med = percentile(g, 50.0);
            g.iter().map(|x| (x - med).abs()).collect()
        })
        .collect();

    match fit_one_way(&deviations) {
        Some(fit) => TestStatistic {
            statistic: fit.f,
            p_value: f_survival(fit.f, fit.df_between, fit.df_within),
        },
        None => {
            warn!("no residual degrees of freedom for Levene");
            TestStatistic::nan()
        }
    }
}
