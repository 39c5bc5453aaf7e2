//! Per-Specimen Features
//!
//! `SpecimenFeatures` is the reduced form of one measurement: the scalar
//! metrics exporters and the series aggregator consume. Scalars that can
//! degenerate (zero geometry, ambiguous modulus) carry a validity flag so
//! downstream statistics can exclude sentinels instead of averaging them in.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WORK_INTERVAL_COUNT;

/// A computed scalar plus a validity flag.
///
/// Degenerate inputs produce `FeatureValue::sentinel()` - exporters still see
/// the 0.0 (matching historical export files), but aggregation skips invalid
/// entries when computing means and standard deviations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    /// The computed (or substituted) value.
    pub value: f64,
    /// Whether the value came out of a well-posed computation.
    pub valid: bool,
}

impl FeatureValue {
    /// A valid, computed value.
    pub fn valid(value: f64) -> Self {
        Self { value, valid: true }
    }

    /// The 0.0 sentinel substituted on degenerate input.
    pub fn sentinel() -> Self {
        Self {
            value: 0.0,
            valid: false,
        }
    }
}

/// Raised when a feature is looked up under a name this engine does not know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown feature name: {0}")]
pub struct UnknownFeatureError(pub String);

/// The closed set of scalar features tracked per specimen.
///
/// A closed enum (instead of runtime string keys) gives exhaustive matching
/// wherever features are dispatched; string lookups go through `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Peak pull-out force in N.
    MaxForce,
    /// Embedding length in µm, clipped to the configured cutoff.
    EmbeddingLength,
    /// Fiber diameter in µm (metadata input).
    FiberDiameter,
    /// Apparent interfacial shear strength in MPa.
    Ifss,
    /// Total pull-out work in µJ.
    Work,
    /// Pre-peak stiffness proxy in N/µm.
    ForceModulus,
    /// Work done up to the peak force, in µJ.
    WorkBeforeFmax,
    /// Work done from the peak force to the embedding length, in µJ.
    WorkAfterFmax,
    /// Work normalized by the lateral fiber surface, in µJ/µm².
    AreaNormalizedWork,
}

impl FeatureKind {
    /// Every feature kind, in export order.
    pub const ALL: [FeatureKind; 9] = [
        FeatureKind::MaxForce,
        FeatureKind::EmbeddingLength,
        FeatureKind::FiberDiameter,
        FeatureKind::Ifss,
        FeatureKind::Work,
        FeatureKind::ForceModulus,
        FeatureKind::WorkBeforeFmax,
        FeatureKind::WorkAfterFmax,
        FeatureKind::AreaNormalizedWork,
    ];

    /// The stable snake_case name used in exports and lookups.
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::MaxForce => "max_force",
            FeatureKind::EmbeddingLength => "embedding_length",
            FeatureKind::FiberDiameter => "fiber_diameter",
            FeatureKind::Ifss => "ifss",
            FeatureKind::Work => "work",
            FeatureKind::ForceModulus => "force_modulus",
            FeatureKind::WorkBeforeFmax => "work_before_fmax",
            FeatureKind::WorkAfterFmax => "work_after_fmax",
            FeatureKind::AreaNormalizedWork => "area_normalized_work",
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKind {
    type Err = UnknownFeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownFeatureError(s.to_string()))
    }
}

/// The reduced form of one specimen's measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenFeatures {
    /// Peak force in N (2 decimals).
    pub max_force: f64,
    /// Index of the first point attaining the peak force.
    pub max_force_index: usize,
    /// Embedding length in µm, clipped to the cutoff (2 decimals).
    pub embedding_length: f64,
    /// Fiber diameter in µm, taken from specimen metadata.
    pub fiber_diameter: f64,
    /// Apparent interfacial shear strength in MPa (2 decimals).
    pub ifss: FeatureValue,
    /// Total pull-out work in µJ (3 decimals).
    pub work: f64,
    /// Work per decile of the embedding length, in µJ (3 decimals each).
    pub work_intervals: [f64; WORK_INTERVAL_COUNT],
    /// Decile works as fractions of the total work (4 decimals each).
    /// `None` when the total work is zero; such specimens are excluded from
    /// normalized statistics instead of propagating NaN.
    pub normed_intervals: Option<[f64; WORK_INTERVAL_COUNT]>,
    /// Slope between the 20%- and 70%-of-peak force points, N/µm (4 decimals).
    pub force_modulus: FeatureValue,
    /// Work up to the peak force, µJ (3 decimals).
    pub work_before_fmax: f64,
    /// Work from the peak force to the embedding length, µJ (3 decimals).
    pub work_after_fmax: f64,
    /// Work divided by the lateral surface π·d·l_e, µJ/µm² (6 decimals).
    pub area_normalized_work: FeatureValue,
}

impl SpecimenFeatures {
    /// The named scalar feature as a validity-tagged value.
    pub fn feature(&self, kind: FeatureKind) -> FeatureValue {
        match kind {
            FeatureKind::MaxForce => FeatureValue::valid(self.max_force),
            FeatureKind::EmbeddingLength => FeatureValue::valid(self.embedding_length),
            FeatureKind::FiberDiameter => FeatureValue::valid(self.fiber_diameter),
            FeatureKind::Ifss => self.ifss,
            FeatureKind::Work => FeatureValue::valid(self.work),
            FeatureKind::ForceModulus => self.force_modulus,
            FeatureKind::WorkBeforeFmax => FeatureValue::valid(self.work_before_fmax),
            FeatureKind::WorkAfterFmax => FeatureValue::valid(self.work_after_fmax),
            FeatureKind::AreaNormalizedWork => self.area_normalized_work,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_name_round_trip() {
        for kind in FeatureKind::ALL {
            assert_eq!(kind.as_str().parse::<FeatureKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_feature_name() {
        let err = "peak_load".parse::<FeatureKind>().unwrap_err();
        assert_eq!(err, UnknownFeatureError("peak_load".to_string()));
    }

    #[test]
    fn test_sentinel_is_invalid_zero() {
        let s = FeatureValue::sentinel();
        assert!(!s.valid);
        assert!((s.value - 0.0).abs() < f64::EPSILON);
    }
}
