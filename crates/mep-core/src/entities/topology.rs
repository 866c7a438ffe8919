use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Balancing node for exactly one energy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub name: String,
    pub energy_type: String,
    /// Demand-side response program applied to demand at this bus
    #[serde(default)]
    pub dsr_type: Option<String>,
}

impl Bus {
    pub fn new(name: impl Into<String>, energy_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            energy_type: energy_type.into(),
            dsr_type: None,
        }
    }

    pub fn with_dsr(mut self, dsr: impl Into<String>) -> Self {
        self.dsr_type = Some(dsr.into());
        self
    }
}

/// Directed transmission edge between two buses of the same energy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub name: String,
    pub energy_type: String,
    pub from: String,
    pub to: String,
    /// Fraction of the flow lost in transit, in `[0, 1)`
    #[serde(default)]
    pub transmission_loss: f64,
    pub max_capacity: f64,
    #[serde(default)]
    pub transmission_fee: Option<String>,
}

impl Line {
    pub fn new(
        name: impl Into<String>,
        energy_type: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        max_capacity: f64,
    ) -> Self {
        Self {
            name: name.into(),
            energy_type: energy_type.into(),
            from: from.into(),
            to: to.into(),
            transmission_loss: 0.0,
            max_capacity,
            transmission_fee: None,
        }
    }

    pub fn with_loss(mut self, loss: f64) -> Self {
        self.transmission_loss = loss;
        self
    }
}

/// Bundle of buses, one per energy type, describing one consumer archetype.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalBalancingStack {
    pub name: String,
    /// energy type -> bus receiving that energy type's demand
    pub buses: IndexMap<String, String>,
}

impl LocalBalancingStack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buses: IndexMap::new(),
        }
    }

    pub fn with_bus(mut self, energy_type: impl Into<String>, bus: impl Into<String>) -> Self {
        self.buses.insert(energy_type.into(), bus.into());
        self
    }
}
