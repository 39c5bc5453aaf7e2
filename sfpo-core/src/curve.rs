//! Force-Displacement Curve Model
//!
//! A `Curve` is the validated, immutable input to all reduction operations.
//! The ingestion layer reads raw (displacement, force) pairs from test files;
//! `Curve::clean` applies the same domain filter that layer uses
//! (`0 < displacement < cutoff`, `force >= 0`) so library callers without the
//! I/O layer end up with identical curves.

use serde::{Deserialize, Serialize};

/// One sampled point of a pull-out test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Crosshead displacement in micrometers.
    pub displacement: f64,
    /// Measured pull-out force in newtons.
    pub force: f64,
}

impl CurvePoint {
    /// Create a point from a (displacement, force) pair.
    pub fn new(displacement: f64, force: f64) -> Self {
        Self {
            displacement,
            force,
        }
    }
}

/// An ordered force-displacement curve, immutable once constructed.
///
/// Displacements are expected to be strictly increasing; the reduction
/// operations rely on that ordering for integration and peak search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    /// Build a curve from already-validated points.
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    /// Build a curve from raw (displacement, force) pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            points: pairs
                .into_iter()
                .map(|(d, f)| CurvePoint::new(d, f))
                .collect(),
        }
    }

    /// Build a curve from raw pairs, applying the ingestion domain filter:
    /// points with `displacement <= 0`, `displacement >= cutoff` or
    /// `force < 0` are dropped. Order is preserved.
    pub fn clean(pairs: impl IntoIterator<Item = (f64, f64)>, cutoff: f64) -> Self {
        Self {
            points: pairs
                .into_iter()
                .filter(|&(d, f)| d > 0.0 && d < cutoff && f >= 0.0)
                .map(|(d, f)| CurvePoint::new(d, f))
                .collect(),
        }
    }

    /// The sampled points in displacement order.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Number of sampled points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterator over displacements.
    pub fn displacements(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.displacement)
    }

    /// Iterator over forces.
    pub fn forces(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.force)
    }
}
