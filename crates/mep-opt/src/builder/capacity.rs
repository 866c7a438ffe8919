use super::expressions::yearly_name;
use super::{CapacityVars, ConstraintFamily, VariableRegistry};
use crate::input::{CapacityInput, OptimizationInputData};
use crate::model::{LinearExpr, LinearModel, Sense};

/// `cap[d] - sum of in-service vintages = base capacity while it lives`.
///
/// Bounds on capacity and capacity increase sit on the variables.
pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    for (generator, gen_vars) in input.generators.iter().zip(&vars.generators) {
        evolution(&generator.name, &generator.capacity, &gen_vars.capacity, model);
    }
    for (storage, stor_vars) in input.storages.iter().zip(&vars.storages) {
        evolution(&storage.name, &storage.capacity, &stor_vars.capacity, model);
    }
}

fn evolution(name: &str, input: &CapacityInput, vars: &CapacityVars, model: &mut LinearModel) {
    for (d, vintages) in input.vintages.iter().enumerate() {
        let mut expr = LinearExpr::new();
        expr.add(vars.cap[d], 1.0);
        for &vintage in vintages {
            expr.add(vars.cap_plus[vintage], -1.0);
        }
        let base = if input.base_alive[d] {
            input.base_capacity
        } else {
            0.0
        };
        model.add_row(
            yearly_name("capacity", name, d),
            ConstraintFamily::CapacityEvolution,
            &expr,
            Sense::Eq,
            base,
        );
    }
}
