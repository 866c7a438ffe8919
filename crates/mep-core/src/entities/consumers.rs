use super::YearSeries;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Normalized hourly demand shapes, one per energy type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandProfile {
    pub name: String,
    /// energy type -> hourly share of yearly usage over `[0, n_hours)`
    pub normalized_profile: IndexMap<String, Vec<f64>>,
}

impl DemandProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normalized_profile: IndexMap::new(),
        }
    }

    pub fn with_profile(mut self, energy_type: impl Into<String>, profile: Vec<f64>) -> Self {
        self.normalized_profile.insert(energy_type.into(), profile);
        self
    }
}

/// A group of real consumers distributed over local balancing stacks.
///
/// The demand attached to stack `l` for energy type `e` in year `y` is
/// `fraction[l, y] * yearly_energy_usage[e][y] * n_consumers[y]`, shaped
/// over hours by the demand profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedConsumer {
    pub name: String,
    pub demand_profile: String,
    /// Stack -> fraction of consumers in the first planning year
    pub stack_base_fraction: IndexMap<String, f64>,
    /// energy type -> yearly usage of a single consumer
    pub yearly_energy_usage: IndexMap<String, Vec<f64>>,
    pub n_consumers: Vec<f64>,
    #[serde(default)]
    pub min_fraction: IndexMap<String, YearSeries>,
    #[serde(default)]
    pub max_fraction: IndexMap<String, YearSeries>,
    #[serde(default)]
    pub max_fraction_increase: IndexMap<String, YearSeries>,
    #[serde(default)]
    pub max_fraction_decrease: IndexMap<String, YearSeries>,
}

impl AggregatedConsumer {
    pub fn new(name: impl Into<String>, demand_profile: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            demand_profile: demand_profile.into(),
            ..Self::default()
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>, base_fraction: f64) -> Self {
        self.stack_base_fraction.insert(stack.into(), base_fraction);
        self
    }

    pub fn with_usage(mut self, energy_type: impl Into<String>, usage: Vec<f64>) -> Self {
        self.yearly_energy_usage.insert(energy_type.into(), usage);
        self
    }

    pub fn stacks(&self) -> impl Iterator<Item = &str> {
        self.stack_base_fraction.keys().map(String::as_str)
    }
}

/// Demand-side response program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dsr {
    pub name: String,
    /// Energy that must be recovered per unit of shifted demand
    pub compensation_factor: f64,
    /// Length in hours of the window within which shifts must balance
    pub balancing_period_len: usize,
    /// Cost per unit of shifted demand
    #[serde(default)]
    pub penalization: f64,
    /// Maximum shift as a fraction of hourly demand
    #[serde(default)]
    pub relative_shift_limit: Option<f64>,
    /// Maximum shift per hour
    #[serde(default)]
    pub abs_shift_limit: Option<f64>,
}
