//! LP/MILP model construction.
//!
//! The builder turns [`OptimizationInputData`] into a [`LinearModel`]. It
//! first creates every decision variable (see [`VariableRegistry`]) and then
//! adds constraint families one at a time. Each [`ConstraintFamily`] is
//! independent of the others, so a family can be built in isolation for
//! inspection or testing:
//!
//! ```no_run
//! # use mep_opt::builder::{ConstraintFamily, ModelBuilder};
//! # fn demo(input: &mep_opt::OptimizationInputData) {
//! let mut builder = ModelBuilder::new(input);
//! let rows = builder.build_family(ConstraintFamily::Balance);
//! println!("{rows} balance rows");
//! # }
//! ```

mod balance;
mod capacity;
mod capacity_bounds;
mod chunks;
mod dsr;
mod emissions;
mod expressions;
mod fractions;
mod generation;
mod generation_fraction;
mod objective;
mod reserves;
mod storage;
mod variables;

pub use variables::{
    CapacityVars, ChunkShare, GeneratorVars, HourGrid, StorageVars, VariableRegistry,
};

use crate::error::{OptError, OptResult};
use crate::input::OptimizationInputData;
use crate::model::LinearModel;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Closed set of constraint families, in build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    /// One equality per (bus, sampled hour, decision year)
    Balance,
    /// Installed capacity from base capacity and in-service vintages
    CapacityEvolution,
    /// Output limits, dump limits and ramping
    Generation,
    Storage,
    /// Stack fraction trajectories of consumer aggregates
    Fraction,
    Dsr,
    Emission,
    FuelAvailability,
    PowerReserve,
    DemandChunk,
    GenerationFraction,
    CapacityBound,
}

impl ConstraintFamily {
    pub const ALL: [ConstraintFamily; 12] = [
        ConstraintFamily::Balance,
        ConstraintFamily::CapacityEvolution,
        ConstraintFamily::Generation,
        ConstraintFamily::Storage,
        ConstraintFamily::Fraction,
        ConstraintFamily::Dsr,
        ConstraintFamily::Emission,
        ConstraintFamily::FuelAvailability,
        ConstraintFamily::PowerReserve,
        ConstraintFamily::DemandChunk,
        ConstraintFamily::GenerationFraction,
        ConstraintFamily::CapacityBound,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConstraintFamily::Balance => "balance",
            ConstraintFamily::CapacityEvolution => "capacity_evolution",
            ConstraintFamily::Generation => "generation",
            ConstraintFamily::Storage => "storage",
            ConstraintFamily::Fraction => "fraction",
            ConstraintFamily::Dsr => "dsr",
            ConstraintFamily::Emission => "emission",
            ConstraintFamily::FuelAvailability => "fuel_availability",
            ConstraintFamily::PowerReserve => "power_reserve",
            ConstraintFamily::DemandChunk => "demand_chunk",
            ConstraintFamily::GenerationFraction => "generation_fraction",
            ConstraintFamily::CapacityBound => "capacity_bound",
        }
    }
}

impl std::fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental model construction over one input.
pub struct ModelBuilder<'a> {
    input: &'a OptimizationInputData,
    vars: VariableRegistry,
    model: LinearModel,
}

impl<'a> ModelBuilder<'a> {
    /// Create every decision variable; no rows are added yet.
    pub fn new(input: &'a OptimizationInputData) -> Self {
        let mut model = LinearModel::new(input.config.numeric_tolerance);
        let vars = VariableRegistry::create(input, &mut model);
        Self { input, vars, model }
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.vars
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Add one family's rows, returning how many were added.
    pub fn build_family(&mut self, family: ConstraintFamily) -> usize {
        let before = self.model.rows().len();
        let (input, vars, model) = (self.input, &self.vars, &mut self.model);
        match family {
            ConstraintFamily::Balance => balance::add(input, vars, model),
            ConstraintFamily::CapacityEvolution => capacity::add(input, vars, model),
            ConstraintFamily::Generation => generation::add(input, vars, model),
            ConstraintFamily::Storage => storage::add(input, vars, model),
            ConstraintFamily::Fraction => fractions::add(input, vars, model),
            ConstraintFamily::Dsr => dsr::add(input, vars, model),
            ConstraintFamily::Emission => emissions::add_limits(input, vars, model),
            ConstraintFamily::FuelAvailability => {
                emissions::add_fuel_availability(input, vars, model)
            }
            ConstraintFamily::PowerReserve => reserves::add(input, vars, model),
            ConstraintFamily::DemandChunk => chunks::add(input, vars, model),
            ConstraintFamily::GenerationFraction => generation_fraction::add(input, vars, model),
            ConstraintFamily::CapacityBound => capacity_bounds::add(input, vars, model),
        }
        let rows = self.model.rows().len() - before;
        debug!(family = %family, rows, "constraint family built");
        rows
    }

    pub fn build_objective(&mut self) {
        let objective = objective::expression(self.input, &self.vars);
        self.model.set_objective(&objective);
    }

    pub fn finish(self) -> LinearModel {
        self.model
    }
}

/// Build the complete model: every constraint family plus the objective.
pub fn build(input: &OptimizationInputData) -> OptResult<LinearModel> {
    let start = Instant::now();
    info!(
        buckets = input.n_buckets(),
        hours = input.n_hours(),
        "building optimization model"
    );

    let mut builder = ModelBuilder::new(input);
    for family in ConstraintFamily::ALL {
        builder.build_family(family);
    }
    builder.build_objective();
    let model = builder.finish();

    if let Some(row) = model
        .rows()
        .iter()
        .find(|row| !row.rhs.is_finite() || row.terms.iter().any(|(_, c)| !c.is_finite()))
    {
        return Err(OptError::ModelConstruction(format!(
            "row '{}' has a non-finite coefficient",
            row.name
        )));
    }
    if model.objective().iter().any(|(_, c)| !c.is_finite()) {
        return Err(OptError::ModelConstruction(
            "objective has a non-finite coefficient".to_string(),
        ));
    }

    let stats = model.stats();
    info!(
        variables = stats.variables,
        integer_variables = stats.integer_variables,
        rows = stats.rows,
        nonzeros = stats.nonzeros,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "optimization model built"
    );
    Ok(model)
}
