//! # mep-opt: Planning Model Construction and Solving
//!
//! Turns a validated [`mep_core::Network`] into a multi-year LP/MILP
//! capacity expansion and dispatch model and solves it through good_lp.
//!
//! The pipeline has four stages, each usable on its own:
//!
//! 1. [`build_indices`] - sampled hours and years, decision-year buckets,
//!    lookup tables
//! 2. [`OptimizationInputData::new`] - per-decision-year parameters
//! 3. [`build`] - the sparse [`LinearModel`], one [`ConstraintFamily`] at a time
//! 4. [`solve`] - a backend run, returning a [`SolveOutcome`]
//!
//! [`plan`] runs all of them and exports the solution.
//!
//! ```no_run
//! use mep_core::{Network, OptimizationConfig};
//! use mep_opt::{plan, Sampling};
//!
//! # fn run(network: Network) -> mep_opt::OptResult<()> {
//! let sampling = Sampling::full(network.n_years(), network.n_hours(), 0.05);
//! let results = plan(network, &sampling, &OptimizationConfig::default())?;
//! println!("objective = {:?}", results.objective);
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod builder;
pub mod error;
pub mod indices;
pub mod input;
pub mod model;
pub mod results;
pub mod solver;

pub use builder::{build, ConstraintFamily, ModelBuilder, VariableRegistry};
pub use error::{OptError, OptResult};
pub use indices::{build_indices, IndexError, Indices, Sampling, YearBucket};
pub use input::OptimizationInputData;
pub use model::{LinearExpr, LinearModel, ProblemClass, Row, Sense, VarId, VarKey, VarKind};
pub use results::{ExportableResults, ResultRecord};
pub use solver::{solve, SolveOutcome, SolveStatus, SolverKind};

use mep_core::{Network, OptimizationConfig};
use tracing::info;

/// Validate, build and solve in one call.
///
/// Returns the results expanded onto physical years. A solve that does
/// not reach optimality is an [`OptError::SolverStatus`].
pub fn plan(
    network: Network,
    sampling: &Sampling,
    config: &OptimizationConfig,
) -> OptResult<ExportableResults> {
    config.validate()?;
    let network = network.into_validated_with(&config.validator())?;
    let indices = build_indices(&network, sampling, config)?;
    let input = OptimizationInputData::new(&network, indices, config.clone())?;
    let model = build(&input)?;
    let outcome = solve(&model, &config.solver)?.into_result()?;
    info!(objective = outcome.objective, "plan solved");
    Ok(ExportableResults::from_outcome(&model, &outcome).expand_years(&input.indices))
}
