use super::expressions::yearly_name;
use super::{ConstraintFamily, VariableRegistry};
use crate::input::OptimizationInputData;
use crate::model::{LinearExpr, LinearModel, Sense};

/// Stack fractions of every aggregate sum to one and follow their bounds.
///
/// First-year fractions are fixed to the base fractions by variable bounds,
/// so min/max rows start at the second decision year.
pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    for (aggregate, stacks) in input.aggregates.iter().zip(&vars.fractions) {
        if stacks.is_empty() {
            continue;
        }
        for d in 0..input.n_buckets() {
            let mut total = LinearExpr::new();
            for slot in stacks {
                total.add(slot[d], 1.0);
            }
            model.add_row(
                yearly_name("fraction_sum", &aggregate.name, d),
                ConstraintFamily::Fraction,
                &total,
                Sense::Eq,
                1.0,
            );
        }

        for (slot, frac) in stacks.iter().enumerate() {
            let entity = format!("{},{}", aggregate.name, aggregate.stack_names[slot]);
            for d in 1..input.n_buckets() {
                let mut single = LinearExpr::new();
                single.add(frac[d], 1.0);
                if let Some(min) = aggregate.min_fraction[slot][d] {
                    model.add_row(
                        yearly_name("fraction_min", &entity, d),
                        ConstraintFamily::Fraction,
                        &single,
                        Sense::Ge,
                        min,
                    );
                }
                if let Some(max) = aggregate.max_fraction[slot][d] {
                    model.add_row(
                        yearly_name("fraction_max", &entity, d),
                        ConstraintFamily::Fraction,
                        &single,
                        Sense::Le,
                        max,
                    );
                }

                let mut change = LinearExpr::new();
                change.add(frac[d], 1.0).add(frac[d - 1], -1.0);
                if let Some(increase) = aggregate.max_fraction_increase[slot][d] {
                    model.add_row(
                        yearly_name("fraction_increase", &entity, d),
                        ConstraintFamily::Fraction,
                        &change,
                        Sense::Le,
                        increase,
                    );
                }
                if let Some(decrease) = aggregate.max_fraction_decrease[slot][d] {
                    model.add_row(
                        yearly_name("fraction_decrease", &entity, d),
                        ConstraintFamily::Fraction,
                        &change,
                        Sense::Ge,
                        -decrease,
                    );
                }
            }
        }
    }
}
