use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fuel burned by generators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fuel {
    pub name: String,
    /// emission type -> emission per unit of fuel
    #[serde(default)]
    pub emission: IndexMap<String, f64>,
    /// Maximum yearly consumption; empty means unlimited
    #[serde(default)]
    pub availability: Vec<Option<f64>>,
    /// Price per unit of fuel, per year
    pub cost: Vec<f64>,
    /// Energy released per unit of fuel
    pub energy_per_unit: f64,
}

/// Hourly availability of a non-dispatchable resource, in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityFactor {
    pub name: String,
    pub profile: Vec<f64>,
}

/// Price per emitted unit of one emission type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionFee {
    pub name: String,
    pub emission_type: String,
    /// Price per year
    pub price: Vec<f64>,
}

/// Price per transmitted unit of energy, per hour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransmissionFee {
    pub name: String,
    pub fee: Vec<f64>,
}
