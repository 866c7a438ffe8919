//! Records that constrain technologies rather than describe them.

use super::YearSeries;
use serde::{Deserialize, Serialize};

/// Relation between the two sides of a [`CapacityBound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoundSense {
    Eq,
    Leq,
}

/// Reference to the capacity of a technology instance or of every instance
/// of a technology type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TechnologyRef {
    Generator(String),
    Storage(String),
    GeneratorType(String),
    StorageType(String),
}

impl TechnologyRef {
    pub fn name(&self) -> &str {
        match self {
            TechnologyRef::Generator(name)
            | TechnologyRef::Storage(name)
            | TechnologyRef::GeneratorType(name)
            | TechnologyRef::StorageType(name) => name,
        }
    }
}

impl std::fmt::Display for TechnologyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TechnologyRef::Generator(name) => write!(f, "generator '{name}'"),
            TechnologyRef::Storage(name) => write!(f, "storage '{name}'"),
            TechnologyRef::GeneratorType(name) => write!(f, "generator type '{name}'"),
            TechnologyRef::StorageType(name) => write!(f, "storage type '{name}'"),
        }
    }
}

/// `left_coefficient * CAP(left) <sense> CAP(right)` in every decision year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityBound {
    pub name: String,
    pub left: TechnologyRef,
    pub right: TechnologyRef,
    pub sense: BoundSense,
    #[serde(default = "default_coefficient")]
    pub left_coefficient: f64,
    /// Restrict type references to units serving this aggregate
    #[serde(default)]
    pub aggregate: Option<String>,
}

fn default_coefficient() -> f64 {
    1.0
}

impl CapacityBound {
    pub fn new(
        name: impl Into<String>,
        left: TechnologyRef,
        sense: BoundSense,
        right: TechnologyRef,
    ) -> Self {
        Self {
            name: name.into(),
            left,
            right,
            sense,
            left_coefficient: default_coefficient(),
            aggregate: None,
        }
    }
}

/// Granularity of a [`GenerationFraction`] constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FractionType {
    Yearly,
    Hourly,
}

/// Bounds the generation of the `sub_tag` group relative to the `tag` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationFraction {
    pub name: String,
    /// Reference group
    pub tag: String,
    /// Bounded group
    pub sub_tag: String,
    pub energy_type: String,
    pub fraction_type: FractionType,
    #[serde(default)]
    pub min_generation_fraction: YearSeries,
    #[serde(default)]
    pub max_generation_fraction: YearSeries,
}

/// Demand that must be met by a tagged group within restricted hour windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandChunk {
    pub name: String,
    pub tag: String,
    pub energy_type: String,
    /// Half-open hour windows `[start, end)`
    pub periods: Vec<(usize, usize)>,
    /// `demand[period][year]`
    pub demand: Vec<Vec<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_bound_from_json() {
        let json = r#"{
            "name": "nuclear_vs_wind",
            "left": {"kind": "generator", "name": "PP_nuclear"},
            "right": {"kind": "generator_type", "name": "wind"},
            "sense": "LEQ"
        }"#;
        let bound: CapacityBound = serde_json::from_str(json).unwrap();
        assert_eq!(bound.left, TechnologyRef::Generator("PP_nuclear".into()));
        assert_eq!(bound.sense, BoundSense::Leq);
        assert_eq!(bound.left_coefficient, 1.0);
        assert_eq!(bound.right.to_string(), "generator type 'wind'");
    }
}
