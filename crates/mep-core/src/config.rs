//! Optimization configuration values.
//!
//! The structs here are plain serde records. Every field has a default so a
//! partial YAML or JSON document is enough; [`OptimizationConfig::validate`]
//! range-checks the result.

use crate::error::{MepError, MepResult};
use crate::validation::{NetworkValidator, ValidationMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How generator capex and opex relate to installed capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityCost {
    /// Costs apply to installed (input) capacity
    #[default]
    Brutto,
    /// Costs are scaled by the mean efficiency of the first output
    Netto,
}

/// How year-series parameters collapse onto a bucket of aggregated years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    /// Value at the last sampled year of the bucket
    #[default]
    Last,
    /// Mean over the sampled years of the bucket
    Mean,
    /// Last for levels, sum for increments, mean for prices
    Combined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Backend name: `auto`, `clarabel`, `microlp` or `highs`
    #[serde(default = "default_solver_name")]
    pub name: String,
    #[serde(default)]
    pub time_limit_seconds: Option<f64>,
    #[serde(default)]
    pub verbose: bool,
}

fn default_solver_name() -> String {
    "auto".to_string()
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            name: default_solver_name(),
            time_limit_seconds: None,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Local balancing stack fractions are 0/1 decisions
    #[serde(default)]
    pub binary_fraction: bool,
    /// Objective divisor
    #[serde(default = "default_money_scale")]
    pub money_scale: f64,
    /// Cost per unit of energy not served; `None` or zero disables ENS
    #[serde(default)]
    pub ens_penalty_cost: Option<f64>,
    /// Weight sampled hours by `n_hours / |hour_sample|`
    #[serde(default = "default_true")]
    pub use_hourly_scale: bool,
    #[serde(default = "default_numeric_tolerance")]
    pub numeric_tolerance: f64,
    #[serde(default)]
    pub generator_capacity_cost: CapacityCost,
    /// Number of consecutive sampled years grouped into one decision year
    #[serde(default = "default_aggregation")]
    pub n_years_aggregation: usize,
    #[serde(default)]
    pub aggregation_method: AggregationMethod,
    #[serde(default)]
    pub validation_mode: ValidationMode,
    #[serde(default)]
    pub solver: SolverSettings,
}

fn default_money_scale() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_numeric_tolerance() -> f64 {
    1e-12
}

fn default_aggregation() -> usize {
    1
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            binary_fraction: false,
            money_scale: default_money_scale(),
            ens_penalty_cost: None,
            use_hourly_scale: default_true(),
            numeric_tolerance: default_numeric_tolerance(),
            generator_capacity_cost: CapacityCost::default(),
            n_years_aggregation: default_aggregation(),
            aggregation_method: AggregationMethod::default(),
            validation_mode: ValidationMode::default(),
            solver: SolverSettings::default(),
        }
    }
}

impl OptimizationConfig {
    /// Network validator matching this configuration.
    pub fn validator(&self) -> NetworkValidator {
        NetworkValidator::new(self.validation_mode).with_binary_fraction(self.binary_fraction)
    }

    pub fn validate(&self) -> MepResult<()> {
        if !(self.money_scale > 0.0 && self.money_scale.is_finite()) {
            return Err(MepError::Config(format!(
                "money_scale must be positive, got {}",
                self.money_scale
            )));
        }
        if let Some(cost) = self.ens_penalty_cost {
            if !(cost >= 0.0 && cost.is_finite()) {
                return Err(MepError::Config(format!(
                    "ens_penalty_cost must be non-negative, got {cost}"
                )));
            }
        }
        if !(self.numeric_tolerance >= 0.0) {
            return Err(MepError::Config(format!(
                "numeric_tolerance must be non-negative, got {}",
                self.numeric_tolerance
            )));
        }
        if self.n_years_aggregation == 0 {
            return Err(MepError::Config(
                "n_years_aggregation must be at least 1".into(),
            ));
        }
        if let Some(limit) = self.solver.time_limit_seconds {
            if !(limit > 0.0) {
                return Err(MepError::Config(format!(
                    "solver.time_limit_seconds must be positive, got {limit}"
                )));
            }
        }
        if self.solver.name.trim().is_empty() {
            return Err(MepError::Config("solver.name cannot be empty".into()));
        }
        Ok(())
    }

    /// Energy-not-served variables are part of the model.
    pub fn ens_enabled(&self) -> bool {
        self.ens_penalty_cost.is_some_and(|cost| cost > 0.0)
    }

    pub fn from_yaml_str(data: &str) -> MepResult<Self> {
        let config: Self = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }
}

/// Read a configuration file, choosing the format from its extension.
pub fn load_from_path(path: &Path) -> Result<OptimizationConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading optimization config '{}'", path.display()))?;
    let config: OptimizationConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing optimization config yaml")?
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing optimization config json")?
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing optimization config")?,
    };
    config
        .validate()
        .with_context(|| format!("invalid optimization config '{}'", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_file(suffix: &str) -> NamedTempFile {
        Builder::new().suffix(suffix).tempfile().unwrap()
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = OptimizationConfig::from_yaml_str(
            "binary_fraction: true\naggregation_method: combined\nsolver:\n  name: microlp\n",
        )
        .unwrap();
        assert!(config.binary_fraction);
        assert_eq!(config.aggregation_method, AggregationMethod::Combined);
        assert_eq!(config.money_scale, 1.0);
        assert_eq!(config.n_years_aggregation, 1);
        assert_eq!(config.solver.name, "microlp");
        assert!(config.use_hourly_scale);
        assert!(!config.ens_enabled());
    }

    #[test]
    fn collect_and_report_alias() {
        let config =
            OptimizationConfig::from_yaml_str("validation_mode: collect_and_report\n").unwrap();
        assert_eq!(config.validation_mode, ValidationMode::Collect);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = OptimizationConfig {
            money_scale: 0.0,
            ..OptimizationConfig::default()
        };
        assert!(matches!(config.validate(), Err(MepError::Config(_))));

        let config = OptimizationConfig {
            n_years_aggregation: 0,
            ..OptimizationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = OptimizationConfig {
            ens_penalty_cost: Some(-1.0),
            ..OptimizationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_ens_cost_disables_ens() {
        let mut config = OptimizationConfig {
            ens_penalty_cost: Some(0.0),
            ..OptimizationConfig::default()
        };
        assert!(!config.ens_enabled());
        config.ens_penalty_cost = Some(1000.0);
        assert!(config.ens_enabled());
    }

    #[test]
    fn loads_json_by_extension() {
        let mut file = temp_file(".json");
        write!(file, r#"{{"money_scale": 1000.0, "generator_capacity_cost": "netto"}}"#).unwrap();
        let config = load_from_path(file.path()).unwrap();
        assert_eq!(config.money_scale, 1000.0);
        assert_eq!(config.generator_capacity_cost, CapacityCost::Netto);
    }

    #[test]
    fn loader_reports_invalid_values() {
        let mut file = temp_file(".yaml");
        writeln!(file, "money_scale: -5").unwrap();
        let err = load_from_path(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("money_scale"));
    }
}
