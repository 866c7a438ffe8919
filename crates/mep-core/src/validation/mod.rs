//! Batch validation of a [`Network`].
//!
//! The validator runs a closed set of independent check families
//! ([`NetworkCheck`]) over a network and records every finding in a
//! [`Diagnostics`] collection. It never mutates the network.
//!
//! Two failure modes are supported:
//!
//! - [`ValidationMode::Strict`] stops after the first check family that
//!   produced an error
//! - [`ValidationMode::Collect`] runs every family and reports all errors at once
//!
//! Warnings never cause validation to fail.

mod checks;

use crate::diagnostics::{DiagnosticIssue, Diagnostics};
use crate::network::Network;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the validator reacts to the first failing check family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    #[default]
    Strict,
    #[serde(alias = "collect_and_report")]
    Collect,
}

/// A single validation failure.
pub type ValidationError = DiagnosticIssue;

/// The errors that made validation fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Diagnostics,
}

impl ValidationReport {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.diagnostics.errors()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.diagnostics.summary())?;
        for issue in self.diagnostics.errors() {
            write!(f, "\n  {}", issue)?;
        }
        Ok(())
    }
}

/// The check families, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkCheck {
    /// Name uniqueness within every collection
    Names,
    /// Every cross-element reference resolves
    References,
    /// Buses, lines, units and stacks agree on energy types
    EnergyTypes,
    /// Capacity trajectories are well formed and within type bounds
    CapacityTrajectories,
    CapacityBounds,
    PowerReserves,
    /// Stack fractions of aggregates and DSR parameters
    Fractions,
    GenerationFractions,
    DemandChunks,
    /// Series lengths and scalar ranges of the remaining parameters
    Parameters,
    /// Islands without supply
    Topology,
}

impl NetworkCheck {
    pub const ALL: [NetworkCheck; 11] = [
        NetworkCheck::Names,
        NetworkCheck::References,
        NetworkCheck::EnergyTypes,
        NetworkCheck::CapacityTrajectories,
        NetworkCheck::CapacityBounds,
        NetworkCheck::PowerReserves,
        NetworkCheck::Fractions,
        NetworkCheck::GenerationFractions,
        NetworkCheck::DemandChunks,
        NetworkCheck::Parameters,
        NetworkCheck::Topology,
    ];

    /// Diagnostic category used by issues from this family.
    pub fn category(self) -> &'static str {
        match self {
            NetworkCheck::Names => "names",
            NetworkCheck::References => "reference",
            NetworkCheck::EnergyTypes => "energy_type",
            NetworkCheck::CapacityTrajectories => "capacity",
            NetworkCheck::CapacityBounds => "capacity_bound",
            NetworkCheck::PowerReserves => "power_reserve",
            NetworkCheck::Fractions => "fraction",
            NetworkCheck::GenerationFractions => "generation_fraction",
            NetworkCheck::DemandChunks => "demand_chunk",
            NetworkCheck::Parameters => "parameter",
            NetworkCheck::Topology => "topology",
        }
    }

    pub fn run(self, network: &Network, options: &CheckOptions, diag: &mut Diagnostics) {
        let tolerance = options.tolerance;
        let mut sink = checks::Sink::new(self.category(), diag);
        match self {
            NetworkCheck::Names => checks::names(network, &mut sink),
            NetworkCheck::References => checks::references(network, &mut sink),
            NetworkCheck::EnergyTypes => checks::energy_types(network, &mut sink),
            NetworkCheck::CapacityTrajectories => checks::capacity_trajectories(network, &mut sink),
            NetworkCheck::CapacityBounds => checks::capacity_bounds(network, &mut sink),
            NetworkCheck::PowerReserves => checks::power_reserves(network, &mut sink),
            NetworkCheck::Fractions => {
                checks::fractions(network, tolerance, options.binary_fraction, &mut sink)
            }
            NetworkCheck::GenerationFractions => checks::generation_fractions(network, &mut sink),
            NetworkCheck::DemandChunks => checks::demand_chunks(network, &mut sink),
            NetworkCheck::Parameters => checks::parameters(network, &mut sink),
            NetworkCheck::Topology => checks::topology(network, &mut sink),
        }
    }
}

/// Settings shared by the check families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOptions {
    /// Tolerance used when comparing fractions against 0 and 1
    pub tolerance: f64,
    /// Stack fractions will be solved as 0/1 decisions
    pub binary_fraction: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            binary_fraction: false,
        }
    }
}

/// Configured validator.
#[derive(Debug, Clone)]
pub struct NetworkValidator {
    mode: ValidationMode,
    options: CheckOptions,
    checks: Vec<NetworkCheck>,
}

impl NetworkValidator {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            options: CheckOptions::default(),
            checks: NetworkCheck::ALL.to_vec(),
        }
    }

    /// Tolerance used when comparing fraction sums against one.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.options.tolerance = tolerance;
        self
    }

    /// Require base and yearly stack fractions to be 0 or 1.
    pub fn with_binary_fraction(mut self, binary_fraction: bool) -> Self {
        self.options.binary_fraction = binary_fraction;
        self
    }

    /// Restrict the run to the given check families.
    pub fn with_checks(mut self, checks: &[NetworkCheck]) -> Self {
        self.checks = checks.to_vec();
        self
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn run(&self, network: &Network) -> Diagnostics {
        let mut diag = Diagnostics::new();
        for check in &self.checks {
            let errors_before = diag.error_count();
            check.run(network, &self.options, &mut diag);
            let new_errors = diag.error_count() - errors_before;
            debug!(check = check.category(), new_errors, "validation check done");
            if new_errors > 0 && self.mode == ValidationMode::Strict {
                break;
            }
        }
        diag
    }
}

/// Run every check and return the errors found.
pub fn validate(network: &Network, mode: ValidationMode) -> Vec<ValidationError> {
    NetworkValidator::new(mode)
        .run(network)
        .errors()
        .cloned()
        .collect()
}
