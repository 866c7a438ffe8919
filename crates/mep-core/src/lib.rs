//! # mep-core: Multi-Energy Network Model
//!
//! Data model, configuration and batch validation for multi-energy planning
//! networks: buses of one energy type each, transmission lines between
//! them, generating and storage technologies, and consumer aggregates spread
//! over local balancing stacks.
//!
//! ## Quick Start
//!
//! ```rust
//! use mep_core::*;
//!
//! let mut network = Network::new(NetworkConstants::new(1, 2))
//!     .with_energy_types(["electricity"]);
//! network.add_bus(Bus::new("EE_1", "electricity")).unwrap();
//! network
//!     .add_generator_type(
//!         GeneratorType::new("gas", TechnologyParams::flat(20, 1, 100.0, 5.0))
//!             .with_output("electricity", 0.55),
//!     )
//!     .unwrap();
//! network
//!     .add_generator(Generator::new("PP_1", "gas").with_bus("EE_1"))
//!     .unwrap();
//!
//! let validated = network.into_validated(ValidationMode::Collect).unwrap();
//! assert_eq!(validated.generators.len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`entities`] - element records (Bus, Line, GeneratorType, ...)
//! - [`network`] - the owning [`Network`] and its validated form
//! - [`validation`] - check families and failure modes
//! - [`diagnostics`] - issue collection shared by every check
//! - [`graph_utils`] - petgraph view of buses and lines
//! - [`config`] - optimization settings

pub mod arena;
pub mod config;
pub mod diagnostics;
pub mod entities;
pub mod error;
pub mod graph_utils;
pub mod ids;
pub mod network;
pub mod validation;

pub use arena::ElementArena;
pub use config::{AggregationMethod, CapacityCost, OptimizationConfig, SolverSettings};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use entities::*;
pub use error::{MepError, MepResult};
pub use graph_utils::{find_islands, graph_stats, GraphStats, IslandAnalysis, IslandSummary};
pub use ids::*;
pub use network::{Network, NetworkConstants, PowerReserve, ValidatedNetwork};
pub use validation::{
    validate, CheckOptions, NetworkCheck, NetworkValidator, ValidationError, ValidationMode,
    ValidationReport,
};
