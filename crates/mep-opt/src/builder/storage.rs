use super::expressions::hourly_name;
use super::{ConstraintFamily, VariableRegistry};
use crate::input::OptimizationInputData;
use crate::model::{LinearExpr, LinearModel, Sense};

/// State-of-charge dynamics and power limits.
///
/// The state of charge is pinned to zero at the first sampled hour of each
/// decision year and at every cycle boundary through its variable bounds.
pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    let hours = &input.indices.hours;
    for (storage, stor_vars) in input.storages.iter().zip(&vars.storages) {
        let name = storage.name.as_str();
        for d in 0..input.n_buckets() {
            let cap = stor_vars.capacity.cap[d];
            for (i, &hour) in hours.iter().enumerate() {
                let (gen, load, soc) = (
                    stor_vars.gen[d][i],
                    stor_vars.load[d][i],
                    stor_vars.soc[d][i],
                );

                if let Some(&next) = stor_vars.soc[d].get(i + 1) {
                    let mut expr = LinearExpr::new();
                    expr.add(next, 1.0)
                        .add(soc, -(1.0 - storage.energy_loss))
                        .add(load, -storage.load_efficiency)
                        .add(gen, 1.0);
                    model.add_row(
                        hourly_name("soc", name, d, hour),
                        ConstraintFamily::Storage,
                        &expr,
                        Sense::Eq,
                        0.0,
                    );
                }

                let mut expr = LinearExpr::new();
                expr.add(soc, 1.0).add(cap, -1.0);
                model.add_row(
                    hourly_name("soc_max", name, d, hour),
                    ConstraintFamily::Storage,
                    &expr,
                    Sense::Le,
                    0.0,
                );

                let mut expr = LinearExpr::new();
                expr.add(gen, 1.0).add(soc, -1.0);
                model.add_row(
                    hourly_name("stor_gen_max", name, d, hour),
                    ConstraintFamily::Storage,
                    &expr,
                    Sense::Le,
                    0.0,
                );

                if !stor_vars.chunks.is_empty() {
                    let mut expr = LinearExpr::new();
                    for share in &stor_vars.chunks {
                        expr.add(share.grid[d][i], 1.0);
                    }
                    expr.add(gen, -storage.generation_efficiency);
                    model.add_row(
                        hourly_name("stor_chunk_max", name, d, hour),
                        ConstraintFamily::Storage,
                        &expr,
                        Sense::Le,
                        0.0,
                    );
                }

                let mut expr = LinearExpr::new();
                expr.add(gen, 1.0).add(load, 1.0);
                for (_, reserve) in &stor_vars.reserve {
                    expr.add(reserve[d][i], 1.0);
                }
                expr.add(cap, -storage.power_to_capacity);
                model.add_row(
                    hourly_name("stor_power", name, d, hour),
                    ConstraintFamily::Storage,
                    &expr,
                    Sense::Le,
                    0.0,
                );
            }
        }
    }
}
