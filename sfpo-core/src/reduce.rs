//! Curve Reduction
//!
//! Per-specimen feature extraction from one force-displacement curve.
//! All integrals use the trapezoidal rule - the same rule everywhere, so
//! total work, decile intervals and the pre/post-peak split stay mutually
//! consistent and reproducible.
//!
//! Failure semantics: an empty curve is structural misuse and returns
//! `ReduceError::EmptyCurve`; degenerate geometry (zero diameter, zero
//! embedding length, ambiguous modulus ordering) substitutes a logged
//! validity-tagged sentinel and never aborts a batch.

use thiserror::Error;
use tracing::{debug, warn};

use crate::curve::{Curve, CurvePoint};
use crate::features::{FeatureValue, SpecimenFeatures};
use crate::{WORK_INTERVAL_COUNT, round_to};

/// IFSS values above this are logged as implausible (typical values are
/// well below 100 MPa) but kept, since they may still be real.
const IFSS_PLAUSIBILITY_LIMIT_MPA: f64 = 500.0;

/// Errors from reduction operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReduceError {
    /// The curve has no points where at least one is required.
    #[error("curve has no points")]
    EmptyCurve,
}

/// Peak force of the curve in N, rounded to 2 decimals.
pub fn max_force(curve: &Curve) -> Result<f64, ReduceError> {
    if curve.is_empty() {
        return Err(ReduceError::EmptyCurve);
    }
    let max = curve.forces().fold(f64::NEG_INFINITY, f64::max);
    Ok(round_to(max, 2))
}

/// Index of the first point attaining the peak force.
pub fn max_force_index(curve: &Curve) -> Result<usize, ReduceError> {
    let points = curve.points();
    if points.is_empty() {
        return Err(ReduceError::EmptyCurve);
    }
    let mut index = 0;
    for (i, p) in points.iter().enumerate() {
        if p.force > points[index].force {
            index = i;
        }
    }
    Ok(index)
}

/// Embedding length in µm: the curve's maximum displacement clipped to
/// `cutoff`, rounded to 2 decimals. Idempotent under re-application with the
/// same cutoff.
pub fn embedding_length(curve: &Curve, cutoff: f64) -> Result<f64, ReduceError> {
    if curve.is_empty() {
        return Err(ReduceError::EmptyCurve);
    }
    let max = curve.displacements().fold(f64::NEG_INFINITY, f64::max);
    Ok(round_to(max.min(cutoff), 2))
}

/// Apparent interfacial shear strength: `F_max / (π · l_e · d) · 1e6` in MPa,
/// rounded to 2 decimals.
///
/// Returns the invalid 0.0 sentinel (logged) when any input is non-positive;
/// aggregation excludes the sentinel from means and stddevs.
pub fn ifss(max_force: f64, embedding_length: f64, fiber_diameter: f64) -> FeatureValue {
    if max_force <= 0.0 || embedding_length <= 0.0 || fiber_diameter <= 0.0 {
        warn!(
            max_force,
            embedding_length, fiber_diameter, "degenerate inputs for IFSS, substituting 0.0"
        );
        return FeatureValue::sentinel();
    }
    let value = max_force / (std::f64::consts::PI * embedding_length * fiber_diameter) * 1e6;
    if value > IFSS_PLAUSIBILITY_LIMIT_MPA {
        warn!(ifss = value, "implausibly high IFSS value");
    }
    FeatureValue::valid(round_to(value, 2))
}

/// Total pull-out work in µJ: trapezoidal integral of force over displacement
/// restricted to `displacement <= embedding_length`, rounded to 3 decimals.
pub fn work(curve: &Curve, embedding_length: f64) -> f64 {
    let limited: Vec<CurvePoint> = curve
        .points()
        .iter()
        .copied()
        .filter(|p| p.displacement <= embedding_length)
        .collect();
    round_to(trapezoid(&limited), 3)
}

/// Work per decile of the embedding length, in µJ (3 decimals each).
///
/// Decile boundaries are rounded to 4 decimals before masking, and each
/// interval is closed on both ends: a point exactly on a boundary belongs to
/// both neighboring intervals. That mirrors the historical export behavior;
/// changing it would change published numbers. Intervals containing fewer
/// than two points integrate to 0.0.
pub fn work_intervals(curve: &Curve, embedding_length: f64) -> [f64; WORK_INTERVAL_COUNT] {
    let limited: Vec<CurvePoint> = curve
        .points()
        .iter()
        .copied()
        .filter(|p| p.displacement <= embedding_length)
        .collect();

    let mut intervals = [0.0; WORK_INTERVAL_COUNT];
    for (k, slot) in intervals.iter_mut().enumerate() {
        let start_x = round_to(embedding_length * k as f64 / 10.0, 4);
        let end_x = round_to(embedding_length * (k + 1) as f64 / 10.0, 4);
        let segment: Vec<CurvePoint> = limited
            .iter()
            .copied()
            .filter(|p| start_x <= p.displacement && p.displacement <= end_x)
            .collect();
        *slot = round_to(trapezoid(&segment), 3);
    }
    intervals
}

/// Decile works as fractions of the total work, rounded to 4 decimals.
///
/// Returns `None` when `total_work` is zero: the specimen is excluded from
/// normalized statistics entirely rather than zero-filled, so NaN never
/// propagates into aggregate tables.
pub fn normed_intervals(
    work_intervals: &[f64; WORK_INTERVAL_COUNT],
    total_work: f64,
) -> Option<[f64; WORK_INTERVAL_COUNT]> {
    if total_work == 0.0 {
        warn!("total work is zero, excluding specimen from normalized statistics");
        return None;
    }
    let mut normed = [0.0; WORK_INTERVAL_COUNT];
    for (slot, interval) in normed.iter_mut().zip(work_intervals) {
        *slot = round_to(interval / total_work, 4);
    }
    Some(normed)
}

/// Pre-peak stiffness proxy in N/µm, rounded to 4 decimals.
///
/// Among the points strictly before the peak, picks the points whose forces
/// are nearest to 20% and 70% of the peak force and returns the slope between
/// them. Degenerate curves (fewer than two pre-peak points, or the 20% point
/// not strictly before the 70% point) yield the invalid 0.0 sentinel.
pub fn force_modulus(curve: &Curve) -> FeatureValue {
    let Ok(peak_index) = max_force_index(curve) else {
        warn!("empty curve for force modulus, substituting 0.0");
        return FeatureValue::sentinel();
    };
    let peak_force = curve.points()[peak_index].force;
    let pre_peak = &curve.points()[..peak_index];
    if pre_peak.len() < 2 {
        warn!(peak_index, "too few pre-peak points for force modulus");
        return FeatureValue::sentinel();
    }

    let point_20 = nearest_by_force(pre_peak, 0.2 * peak_force);
    let point_70 = nearest_by_force(pre_peak, 0.7 * peak_force);

    if point_20.displacement >= point_70.displacement {
        warn!(
            x20 = point_20.displacement,
            x70 = point_70.displacement,
            "20% point does not precede 70% point, substituting 0.0"
        );
        return FeatureValue::sentinel();
    }

    let slope =
        (point_70.force - point_20.force) / (point_70.displacement - point_20.displacement);
    FeatureValue::valid(round_to(slope, 4))
}

/// The point whose force is nearest to `target`. Ties resolve to the earlier
/// point.
fn nearest_by_force(points: &[CurvePoint], target: f64) -> CurvePoint {
    let mut best = points[0];
    for &p in points {
        if (p.force - target).abs() < (best.force - target).abs() {
            best = p;
        }
    }
    best
}

/// Work before and after the peak force, in µJ (3 decimals each).
///
/// The peak point is the shared trapezoid boundary of both segments, so
/// `before + after` reproduces the total work. The after-segment is clipped
/// to `displacement <= embedding_length`.
pub fn work_segments(
    curve: &Curve,
    max_force_index: usize,
    embedding_length: f64,
) -> (f64, f64) {
    let points = curve.points();
    if points.is_empty() {
        warn!("empty curve for work segments");
        return (0.0, 0.0);
    }
    let split = max_force_index.min(points.len() - 1);

    let before = trapezoid(&points[..=split]);
    let after_points: Vec<CurvePoint> = points[split..]
        .iter()
        .copied()
        .filter(|p| p.displacement <= embedding_length)
        .collect();
    let after = trapezoid(&after_points);

    (round_to(before, 3), round_to(after, 3))
}

/// Work normalized by the lateral fiber surface `π · d · l_e`, in µJ/µm²,
/// rounded to 6 decimals. Non-positive geometry yields the invalid 0.0
/// sentinel (logged).
pub fn area_normalized_work(
    work: f64,
    fiber_diameter: f64,
    embedding_length: f64,
) -> FeatureValue {
    if fiber_diameter <= 0.0 || embedding_length <= 0.0 {
        warn!(
            fiber_diameter,
            embedding_length, "degenerate geometry for area-normalized work, substituting 0.0"
        );
        return FeatureValue::sentinel();
    }
    let area = std::f64::consts::PI * fiber_diameter * embedding_length;
    FeatureValue::valid(round_to(work / area, 6))
}

/// Run the full reduction pipeline for one specimen.
pub fn reduce_specimen(
    curve: &Curve,
    fiber_diameter: f64,
    cutoff: f64,
) -> Result<SpecimenFeatures, ReduceError> {
    let max_force = max_force(curve)?;
    let max_force_index = max_force_index(curve)?;
    let embedding_length = embedding_length(curve, cutoff)?;

    let ifss = ifss(max_force, embedding_length, fiber_diameter);
    let work = work(curve, embedding_length);
    let work_intervals = work_intervals(curve, embedding_length);
    let normed_intervals = normed_intervals(&work_intervals, work);
    let force_modulus = force_modulus(curve);
    let (work_before_fmax, work_after_fmax) =
        work_segments(curve, max_force_index, embedding_length);
    let area_normalized_work = area_normalized_work(work, fiber_diameter, embedding_length);

    debug!(
        max_force,
        embedding_length, work, "reduced specimen curve"
    );

    Ok(SpecimenFeatures {
        max_force,
        max_force_index,
        embedding_length,
        fiber_diameter,
        ifss,
        work,
        work_intervals,
        normed_intervals,
        force_modulus,
        work_before_fmax,
        work_after_fmax,
        area_normalized_work,
    })
}

/// Trapezoidal integral over consecutive points.
fn trapezoid(points: &[CurvePoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].displacement - w[0].displacement) * (w[0].force + w[1].force) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_curve() -> Curve {
        Curve::from_pairs([
            (0.0, 0.0),
            (100.0, 0.1),
            (200.0, 0.2),
            (300.0, 0.15),
            (400.0, 0.05),
        ])
    }

    /// 1001 points of a linear ramp: force = displacement / 1000 N over
    /// 0..=1000 µm. Trapezoid is exact for linear data, and every decile
    /// boundary coincides with a sampled point.
    fn linear_ramp() -> Curve {
        Curve::from_pairs((0..=1000).map(|i| (i as f64, i as f64 / 1000.0)))
    }

    #[test]
    fn test_reference_scenario() {
        let curve = reference_curve();
        let mf = max_force(&curve).unwrap();
        let le = embedding_length(&curve, 1000.0).unwrap();
        assert!((mf - 0.2).abs() < 1e-12);
        assert!((le - 400.0).abs() < 1e-12);

        let ifss = ifss(mf, le, 6.0);
        assert!(ifss.valid);
        assert!((ifss.value - 26.53).abs() < 1e-9);

        // 5 + 15 + 17.5 + 10
        let w = work(&curve, le);
        assert!((w - 47.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_curve_is_structural_error() {
        let curve = Curve::default();
        assert_eq!(max_force(&curve), Err(ReduceError::EmptyCurve));
        assert_eq!(max_force_index(&curve), Err(ReduceError::EmptyCurve));
        assert_eq!(embedding_length(&curve, 1000.0), Err(ReduceError::EmptyCurve));
    }

    #[test]
    fn test_embedding_length_clips_and_is_idempotent() {
        let curve = Curve::from_pairs([(100.0, 0.1), (1500.0, 0.2)]);
        let le = embedding_length(&curve, 1000.0).unwrap();
        assert!((le - 1000.0).abs() < 1e-12);

        // Re-deriving from a curve truncated at the cutoff changes nothing.
        let le2 = le.min(1000.0);
        assert!((le2 - le).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ifss_degenerate_inputs() {
        assert_eq!(ifss(0.2, 400.0, 0.0), FeatureValue::sentinel());
        assert_eq!(ifss(0.2, 0.0, 6.0), FeatureValue::sentinel());
        assert_eq!(ifss(0.0, 400.0, 6.0), FeatureValue::sentinel());
    }

    #[test]
    fn test_work_intervals_sum_to_total_on_aligned_grid() {
        let curve = linear_ramp();
        let le = embedding_length(&curve, 1000.0).unwrap();
        let total = work(&curve, le);
        let intervals = work_intervals(&curve, le);

        // Interval k of the ramp integrates to exactly 10k + 5 µJ.
        for (k, &w) in intervals.iter().enumerate() {
            assert!((w - (10.0 * k as f64 + 5.0)).abs() < 1e-9, "interval {k}");
        }
        let sum: f64 = intervals.iter().sum();
        assert!((sum - total).abs() < 1e-3);
        assert!((total - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_sparse_intervals_are_zero_not_error() {
        let curve = Curve::from_pairs([(0.0, 0.0), (1000.0, 1.0)]);
        let intervals = work_intervals(&curve, 1000.0);
        for &w in &intervals {
            assert!((w - 0.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_normed_intervals() {
        let intervals = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let normed = normed_intervals(&intervals, 10.0).unwrap();
        let sum: f64 = normed.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3);

        assert!(normed_intervals(&intervals, 0.0).is_none());
    }

    #[test]
    fn test_force_modulus_reference_curve() {
        // Pre-peak points are (0, 0) and (100, 0.1); nearest to 20% of the
        // peak is (0, 0), nearest to 70% is (100, 0.1).
        let modulus = force_modulus(&reference_curve());
        assert!(modulus.valid);
        assert!((modulus.value - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_force_modulus_degenerate() {
        // Peak at the first point leaves no pre-peak region.
        let curve = Curve::from_pairs([(1.0, 1.0), (2.0, 0.5), (3.0, 0.2)]);
        assert_eq!(force_modulus(&curve), FeatureValue::sentinel());
    }

    #[test]
    fn test_work_segments_share_peak_boundary() {
        let curve = reference_curve();
        let (before, after) = work_segments(&curve, 2, 400.0);
        assert!((before - 20.0).abs() < 1e-9);
        assert!((after - 27.5).abs() < 1e-9);
        assert!((before + after - 47.5).abs() < 1e-3);
    }

    #[test]
    fn test_area_normalized_work() {
        let v = area_normalized_work(47.5, 6.0, 400.0);
        assert!(v.valid);
        let expected = 47.5 / (std::f64::consts::PI * 6.0 * 400.0);
        assert!((v.value - round_to(expected, 6)).abs() < 1e-12);

        assert_eq!(area_normalized_work(47.5, 0.0, 400.0), FeatureValue::sentinel());
        assert_eq!(area_normalized_work(47.5, 6.0, 0.0), FeatureValue::sentinel());
    }

    #[test]
    fn test_reduce_specimen_pipeline() {
        let features = reduce_specimen(&reference_curve(), 6.0, 1000.0).unwrap();
        assert!((features.max_force - 0.2).abs() < 1e-12);
        assert_eq!(features.max_force_index, 2);
        assert!((features.work - 47.5).abs() < 1e-9);
        assert!(features.ifss.valid);
        assert!((features.work_before_fmax + features.work_after_fmax - features.work).abs() < 1e-3);
        assert!(features.normed_intervals.is_some());
    }

    #[test]
    fn test_reduce_specimen_zero_diameter_still_reduces() {
        let features = reduce_specimen(&reference_curve(), 0.0, 1000.0).unwrap();
        assert!(!features.ifss.valid);
        assert!(!features.area_normalized_work.valid);
        assert!((features.work - 47.5).abs() < 1e-9);
    }
}
