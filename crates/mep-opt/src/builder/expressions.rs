//! Expressions shared by several constraint families.

use super::VariableRegistry;
use crate::input::{BusInput, OptimizationInputData, TaggedUnits};
use crate::model::LinearExpr;

/// Hourly demand placed on `bus`: fraction variables times usage and profile.
pub(super) fn demand(
    vars: &VariableRegistry,
    bus: &BusInput,
    d: usize,
    i: usize,
) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for term in &bus.demand {
        expr.add(
            vars.fractions[term.aggregate][term.slot][d],
            term.coefficient(i, d),
        );
    }
    expr
}

/// Gross output of a group of units into their energy type.
pub(super) fn tagged_output(
    input: &OptimizationInputData,
    vars: &VariableRegistry,
    units: &TaggedUnits,
    d: usize,
    i: usize,
) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for &(id, efficiency) in &units.generators {
        expr.add(vars.generators[id.index()].gen[d][i], efficiency);
    }
    for id in &units.storages {
        let efficiency = input.storages[id.index()].generation_efficiency;
        expr.add(vars.storages[id.index()].gen[d][i], efficiency);
    }
    expr
}

/// Hour-weighted yearly output of a group of units.
pub(super) fn yearly_output(
    input: &OptimizationInputData,
    vars: &VariableRegistry,
    units: &TaggedUnits,
    d: usize,
    hours: impl IntoIterator<Item = usize>,
) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for i in hours {
        let weight = input.indices.hour_weights[i];
        expr.add_scaled(&tagged_output(input, vars, units, d, i), weight);
    }
    expr
}

/// Fuel burned by generator `g` over the sampled hours of decision year `d`.
///
/// Returns `None` for units that burn no fuel.
pub(super) fn fuel_use(
    input: &OptimizationInputData,
    vars: &VariableRegistry,
    g: usize,
    d: usize,
) -> Option<LinearExpr> {
    let generator = &input.generators[g];
    let fuel = generator.fuel?;
    let mut expr = LinearExpr::new();
    for (i, &weight) in input.indices.hour_weights.iter().enumerate() {
        expr.add(vars.generators[g].gen[d][i], weight / fuel.energy_per_unit);
    }
    Some(expr)
}

/// `entity,d,h` suffix for hourly row names.
pub(super) fn hourly_name(prefix: &str, entity: &str, d: usize, hour: usize) -> String {
    format!("{prefix}({entity},{d},{hour})")
}

pub(super) fn yearly_name(prefix: &str, entity: &str, d: usize) -> String {
    format!("{prefix}({entity},{d})")
}
