//! Technology templates and their instances.

use super::YearSeries;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameters shared by generator and storage technology templates.
///
/// Year series are indexed by physical year in `[0, n_years)`. An empty
/// bound series means the bound is not applied in any year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyParams {
    /// Operational lifetime in years (at least 1)
    pub life_time: usize,
    /// Years between the build decision and commissioning
    #[serde(default)]
    pub build_time: usize,
    /// Investment cost per unit of capacity, per year of the build decision
    pub capex: Vec<f64>,
    /// Fixed operating cost per unit of installed capacity, per year
    pub opex: Vec<f64>,
    #[serde(default)]
    pub min_capacity: YearSeries,
    #[serde(default)]
    pub max_capacity: YearSeries,
    #[serde(default)]
    pub min_capacity_increase: YearSeries,
    #[serde(default)]
    pub max_capacity_increase: YearSeries,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for TechnologyParams {
    fn default() -> Self {
        Self {
            life_time: 1,
            build_time: 0,
            capex: Vec::new(),
            opex: Vec::new(),
            min_capacity: Vec::new(),
            max_capacity: Vec::new(),
            min_capacity_increase: Vec::new(),
            max_capacity_increase: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl TechnologyParams {
    /// Constant capex/opex over `n_years`, no capacity bounds.
    pub fn flat(life_time: usize, n_years: usize, capex: f64, opex: f64) -> Self {
        Self {
            life_time,
            capex: vec![capex; n_years],
            opex: vec![opex; n_years],
            ..Self::default()
        }
    }
}

/// Physical unit of a technology's installed capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityUnit {
    /// Generator capacity: maximum output rate
    Power,
    /// Storage capacity: maximum state of charge
    Energy,
}

/// Technology template for generating units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorType {
    pub name: String,
    #[serde(flatten)]
    pub params: TechnologyParams,
    /// Output energy type -> conversion efficiency
    pub efficiency: IndexMap<String, f64>,
    #[serde(default)]
    pub fuel: Option<String>,
    /// Hourly availability profile; present for non-dispatchable units
    #[serde(default)]
    pub capacity_factor: Option<String>,
    /// Upper bound on output as a fraction of capacity, default 1
    #[serde(default)]
    pub power_utilization: YearSeries,
    #[serde(default)]
    pub minimal_power_utilization: YearSeries,
    #[serde(default)]
    pub ramp_up: Option<f64>,
    #[serde(default)]
    pub ramp_down: Option<f64>,
    /// Emission type -> reduction fraction per year
    #[serde(default)]
    pub emission_reduction: IndexMap<String, Vec<f64>>,
    #[serde(default)]
    pub disable_dump_energy: bool,
    /// Credit per unit of generation, per year; empty when the type earns none
    #[serde(default)]
    pub generation_compensation: Vec<f64>,
    /// Cost per unit of dumped output, per year
    #[serde(default)]
    pub energy_curtailment_cost: Vec<f64>,
}

impl GeneratorType {
    pub fn new(name: impl Into<String>, params: TechnologyParams) -> Self {
        Self {
            name: name.into(),
            params,
            ..Self::default()
        }
    }

    pub fn with_output(mut self, energy_type: impl Into<String>, efficiency: f64) -> Self {
        self.efficiency.insert(energy_type.into(), efficiency);
        self
    }

    pub fn energy_types(&self) -> impl Iterator<Item = &str> {
        self.efficiency.keys().map(String::as_str)
    }

    pub fn produces(&self, energy_type: &str) -> bool {
        self.efficiency.contains_key(energy_type)
    }

    pub fn is_dispatchable(&self) -> bool {
        self.capacity_factor.is_none()
    }
}

/// Technology template for storages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageType {
    pub name: String,
    #[serde(flatten)]
    pub params: TechnologyParams,
    pub energy_type: String,
    pub generation_efficiency: f64,
    pub load_efficiency: f64,
    /// Maximum charge/discharge rate per unit of energy capacity
    pub power_to_capacity: f64,
    /// Hourly self-discharge fraction
    #[serde(default)]
    pub energy_loss: f64,
    /// State of charge is reset to zero every `cycle_length` hours
    #[serde(default)]
    pub cycle_length: Option<usize>,
}

impl StorageType {
    pub fn new(
        name: impl Into<String>,
        energy_type: impl Into<String>,
        params: TechnologyParams,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            energy_type: energy_type.into(),
            generation_efficiency: 1.0,
            load_efficiency: 1.0,
            power_to_capacity: 1.0,
            energy_loss: 0.0,
            cycle_length: None,
        }
    }
}

/// Per-instance capacity bounds replacing the type defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityOverrides {
    #[serde(default, rename = "unit_min_capacity")]
    pub min_capacity: Option<YearSeries>,
    #[serde(default, rename = "unit_max_capacity")]
    pub max_capacity: Option<YearSeries>,
    #[serde(default, rename = "unit_min_capacity_increase")]
    pub min_capacity_increase: Option<YearSeries>,
    #[serde(default, rename = "unit_max_capacity_increase")]
    pub max_capacity_increase: Option<YearSeries>,
}

/// Capacity bounds in effect for one instance.
#[derive(Debug, Clone, Copy)]
pub struct CapacityLimits<'a> {
    pub min_capacity: &'a [Option<f64>],
    pub max_capacity: &'a [Option<f64>],
    pub min_capacity_increase: &'a [Option<f64>],
    pub max_capacity_increase: &'a [Option<f64>],
}

impl CapacityOverrides {
    /// Overlay the overrides on the type's bounds.
    pub fn resolve<'a>(&'a self, params: &'a TechnologyParams) -> CapacityLimits<'a> {
        CapacityLimits {
            min_capacity: self.min_capacity.as_deref().unwrap_or(&params.min_capacity),
            max_capacity: self.max_capacity.as_deref().unwrap_or(&params.max_capacity),
            min_capacity_increase: self
                .min_capacity_increase
                .as_deref()
                .unwrap_or(&params.min_capacity_increase),
            max_capacity_increase: self
                .max_capacity_increase
                .as_deref()
                .unwrap_or(&params.max_capacity_increase),
        }
    }

    /// `(label, override, type default)` for every overridable series.
    pub fn pairs<'a>(
        &'a self,
        params: &'a TechnologyParams,
    ) -> [(&'static str, Option<&'a [Option<f64>]>, &'a [Option<f64>]); 4] {
        [
            ("min_capacity", self.min_capacity.as_deref(), params.min_capacity.as_slice()),
            ("max_capacity", self.max_capacity.as_deref(), params.max_capacity.as_slice()),
            (
                "min_capacity_increase",
                self.min_capacity_increase.as_deref(),
                params.min_capacity_increase.as_slice(),
            ),
            (
                "max_capacity_increase",
                self.max_capacity_increase.as_deref(),
                params.max_capacity_increase.as_slice(),
            ),
        ]
    }
}

/// A generating unit: an instance of a [`GeneratorType`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub generator_type: String,
    /// Output buses, one per output energy type
    pub buses: Vec<String>,
    /// Capacity installed before the first planning year
    #[serde(default)]
    pub unit_base_cap: f64,
    #[serde(flatten)]
    pub overrides: CapacityOverrides,
    #[serde(default)]
    pub emission_fees: Vec<String>,
    /// Power reserve keys this unit contributes headroom to
    #[serde(default)]
    pub power_reserves: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Generator {
    pub fn new(name: impl Into<String>, generator_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generator_type: generator_type.into(),
            ..Self::default()
        }
    }

    pub fn with_bus(mut self, bus: impl Into<String>) -> Self {
        self.buses.push(bus.into());
        self
    }

    pub fn with_base_capacity(mut self, capacity: f64) -> Self {
        self.unit_base_cap = capacity;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// A storage unit: an instance of a [`StorageType`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub name: String,
    pub storage_type: String,
    pub bus: String,
    #[serde(default)]
    pub unit_base_cap: f64,
    #[serde(flatten)]
    pub overrides: CapacityOverrides,
    #[serde(default)]
    pub power_reserves: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Storage {
    pub fn new(
        name: impl Into<String>,
        storage_type: impl Into<String>,
        bus: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            storage_type: storage_type.into(),
            bus: bus.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_type_defaults() {
        let params = TechnologyParams {
            max_capacity: vec![Some(100.0), Some(100.0)],
            min_capacity: vec![Some(1.0), Some(1.0)],
            ..TechnologyParams::default()
        };
        let overrides = CapacityOverrides {
            max_capacity: Some(vec![Some(10.0), None]),
            ..CapacityOverrides::default()
        };

        let limits = overrides.resolve(&params);
        assert_eq!(limits.max_capacity, &[Some(10.0), None]);
        assert_eq!(limits.min_capacity, &[Some(1.0), Some(1.0)]);
        assert!(limits.max_capacity_increase.is_empty());
    }

    #[test]
    fn generator_deserializes_flattened_overrides() {
        let json = r#"{
            "name": "PP_1",
            "generator_type": "coal_pp",
            "buses": ["EE_1"],
            "unit_base_cap": 5.0,
            "unit_max_capacity": [10.0, null]
        }"#;
        let gen: Generator = serde_json::from_str(json).unwrap();
        assert_eq!(gen.overrides.max_capacity, Some(vec![Some(10.0), None]));
        assert!(gen.overrides.min_capacity.is_none());
        assert!(gen.tags.is_empty());
    }
}
