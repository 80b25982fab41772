//! Spectral coordinates: the 8 named axes, bounded vectors, weights, bindings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Number of semantic axes
pub const N_AXES: usize = 8;

/// The fixed, named semantic axes, in coordinate order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    OrderChaos,
    CreationDestruction,
    LightShadow,
    ActiveReceptive,
    IndividualCollective,
    AscentDescent,
    StasisTransformation,
    VoluntaryFated,
}

impl Axis {
    pub const ALL: [Axis; N_AXES] = [
        Axis::OrderChaos,
        Axis::CreationDestruction,
        Axis::LightShadow,
        Axis::ActiveReceptive,
        Axis::IndividualCollective,
        Axis::AscentDescent,
        Axis::StasisTransformation,
        Axis::VoluntaryFated,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Axis> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::OrderChaos => "order_chaos",
            Axis::CreationDestruction => "creation_destruction",
            Axis::LightShadow => "light_shadow",
            Axis::ActiveReceptive => "active_receptive",
            Axis::IndividualCollective => "individual_collective",
            Axis::AscentDescent => "ascent_descent",
            Axis::StasisTransformation => "stasis_transformation",
            Axis::VoluntaryFated => "voluntary_fated",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in the 8-axis space; every component in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct CoordinateVector([f64; N_AXES]);

impl CoordinateVector {
    /// Validating constructor
    pub fn new(values: [f64; N_AXES]) -> Result<Self, ValidationError> {
        for (axis, &value) in Axis::ALL.iter().zip(values.iter()) {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::CoordinateOutOfRange {
                    axis: axis.name().to_string(),
                    value,
                });
            }
        }
        Ok(Self(values))
    }

    /// Clamp every component into [0, 1] (NaN becomes 0.5)
    pub fn clamped(values: [f64; N_AXES]) -> Self {
        let mut out = values;
        for v in out.iter_mut() {
            *v = if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) };
        }
        Self(out)
    }

    pub fn values(&self) -> &[f64; N_AXES] {
        &self.0
    }

    pub fn get(&self, axis: Axis) -> f64 {
        self.0[axis.index()]
    }
}

impl TryFrom<Vec<f64>> for CoordinateVector {
    type Error = ValidationError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let array: [f64; N_AXES] =
            values
                .as_slice()
                .try_into()
                .map_err(|_| ValidationError::DimensionMismatch {
                    expected: N_AXES,
                    actual: values.len(),
                })?;
        CoordinateVector::new(array)
    }
}

impl From<CoordinateVector> for Vec<f64> {
    fn from(v: CoordinateVector) -> Self {
        v.0.to_vec()
    }
}

/// Non-negative per-axis weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisWeights(pub [f64; N_AXES]);

impl AxisWeights {
    pub fn uniform() -> Self {
        Self([1.0; N_AXES])
    }

    /// All ones except `axis`, which is zeroed
    pub fn without(axis: Axis) -> Self {
        let mut w = [1.0; N_AXES];
        w[axis.index()] = 0.0;
        Self(w)
    }

    pub fn get(&self, axis: Axis) -> f64 {
        self.0[axis.index()]
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Axes with weight > 0
    pub fn active_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .iter()
            .copied()
            .filter(|a| self.0[a.index()] > 0.0)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|w| w.is_finite() && *w >= 0.0) && self.total() > 0.0
    }
}

impl Default for AxisWeights {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Entity → archetype binding produced by the external name matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityArchetypeBinding {
    pub entity_id: String,
    pub archetype_id: String,
    /// Missing when the archetype has no coordinate assignment yet
    #[serde(default)]
    pub coordinates: Option<CoordinateVector>,
    /// Cultural grouping (tradition) of the entity
    #[serde(default)]
    pub tradition: Option<String>,
}

impl EntityArchetypeBinding {
    pub fn new(entity_id: &str, archetype_id: &str, coordinates: CoordinateVector) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            archetype_id: archetype_id.to_string(),
            coordinates: Some(coordinates),
            tradition: None,
        }
    }

    pub fn with_tradition(mut self, tradition: &str) -> Self {
        self.tradition = Some(tradition.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_order_and_names() {
        assert_eq!(Axis::ALL.len(), N_AXES);
        for (i, axis) in Axis::ALL.iter().enumerate() {
            assert_eq!(axis.index(), i);
            assert_eq!(Axis::from_index(i), Some(*axis));
        }
        assert_eq!(Axis::LightShadow.name(), "light_shadow");
        assert_eq!(Axis::from_index(8), None);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(CoordinateVector::new([0.5; N_AXES]).is_ok());
        let mut bad = [0.5; N_AXES];
        bad[2] = 1.2;
        let err = CoordinateVector::new(bad).unwrap_err();
        assert!(err.to_string().contains("light_shadow"));
    }

    #[test]
    fn test_clamped() {
        let v = CoordinateVector::clamped([-0.1, 1.4, 0.3, f64::NAN, 0.0, 1.0, 0.5, 0.2]);
        assert_eq!(v.values()[0], 0.0);
        assert_eq!(v.values()[1], 1.0);
        assert_eq!(v.values()[3], 0.5);
    }

    #[test]
    fn test_binding_json_roundtrip_rejects_bad_length() {
        let json = r#"{"entity_id":"zeus","archetype_id":"sky_father","coordinates":[0.1,0.2]}"#;
        assert!(serde_json::from_str::<EntityArchetypeBinding>(json).is_err());

        let json = r#"{"entity_id":"zeus","archetype_id":"sky_father",
            "coordinates":[0.1,0.2,0.3,0.4,0.5,0.6,0.7,0.8],"tradition":"greek"}"#;
        let binding: EntityArchetypeBinding = serde_json::from_str(json).unwrap();
        assert_eq!(binding.tradition.as_deref(), Some("greek"));
        assert_eq!(binding.coordinates.unwrap().get(Axis::VoluntaryFated), 0.8);
    }

    #[test]
    fn test_weights() {
        let w = AxisWeights::without(Axis::AscentDescent);
        assert_eq!(w.total(), 7.0);
        assert_eq!(w.active_axes().len(), 7);
        assert!(!w.active_axes().contains(&Axis::AscentDescent));
        assert!(!AxisWeights([0.0; N_AXES]).is_valid());
    }
}
