use super::expressions::hourly_name;
use super::{ConstraintFamily, VariableRegistry};
use crate::input::OptimizationInputData;
use crate::model::{LinearExpr, LinearModel, Sense};

/// Reserve held by contributors covers the required share of their capacity.
///
/// Storage capacity counts as power: energy capacity times power-to-capacity.
pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    for (r, reserve) in input.reserves.iter().enumerate() {
        if reserve.generators.is_empty() && reserve.storages.is_empty() {
            continue;
        }
        for d in 0..input.n_buckets() {
            for (i, &hour) in input.indices.hours.iter().enumerate() {
                let mut expr = LinearExpr::new();
                for id in &reserve.generators {
                    let gen_vars = &vars.generators[id.index()];
                    for (_, grid) in gen_vars.reserve.iter().filter(|(pos, _)| *pos == r) {
                        expr.add(grid[d][i], 1.0);
                    }
                    expr.add(gen_vars.capacity.cap[d], -reserve.fraction);
                }
                for id in &reserve.storages {
                    let stor_vars = &vars.storages[id.index()];
                    for (_, grid) in stor_vars.reserve.iter().filter(|(pos, _)| *pos == r) {
                        expr.add(grid[d][i], 1.0);
                    }
                    let power = input.storages[id.index()].power_to_capacity;
                    expr.add(stor_vars.capacity.cap[d], -reserve.fraction * power);
                }
                model.add_row(
                    hourly_name("reserve", &reserve.key, d, hour),
                    ConstraintFamily::PowerReserve,
                    &expr,
                    Sense::Ge,
                    0.0,
                );
            }
        }
    }
}
