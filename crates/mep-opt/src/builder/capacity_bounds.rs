use super::expressions::yearly_name;
use super::{ConstraintFamily, VariableRegistry};
use crate::input::OptimizationInputData;
use crate::model::{LinearExpr, LinearModel, Sense};
use mep_core::BoundSense;

/// `left_coefficient * cap(left) {=, <=} cap(right)` per decision year.
pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    for bound in &input.capacity_bounds {
        let sense = match bound.sense {
            BoundSense::Eq => Sense::Eq,
            BoundSense::Leq => Sense::Le,
        };
        for d in 0..input.n_buckets() {
            let mut expr = LinearExpr::new();
            for &unit in &bound.left {
                expr.add(vars.capacity(unit, d), bound.left_coefficient);
            }
            for &unit in &bound.right {
                expr.add(vars.capacity(unit, d), -1.0);
            }
            model.add_row(
                yearly_name("capacity_bound", &bound.name, d),
                ConstraintFamily::CapacityBound,
                &expr,
                sense,
                0.0,
            );
        }
    }
}
