use super::expressions::{fuel_use, yearly_name};
use super::{ConstraintFamily, VariableRegistry};
use crate::input::OptimizationInputData;
use crate::model::{LinearExpr, LinearModel, Sense};

/// Yearly emission of one type by every fuel-burning generator.
pub(super) fn emission(
    input: &OptimizationInputData,
    vars: &VariableRegistry,
    emission_type: &str,
    d: usize,
) -> LinearExpr {
    let mut expr = LinearExpr::new();
    for (g, generator) in input.generators.iter().enumerate() {
        let Some(fuel) = generator.fuel else { continue };
        let Some(&factor) = input.fuels[fuel.fuel].emission.get(emission_type) else {
            continue;
        };
        let Some(burned) = fuel_use(input, vars, g, d) else {
            continue;
        };
        let scale = factor * (1.0 - generator.reduction(emission_type, d));
        expr.add_scaled(&burned, scale);
    }
    expr
}

pub(super) fn add_limits(
    input: &OptimizationInputData,
    vars: &VariableRegistry,
    model: &mut LinearModel,
) {
    for limit in &input.emission_limits {
        for d in 0..input.n_buckets() {
            let (relative, absolute) = (limit.relative[d], limit.absolute[d]);
            if relative.is_none() && absolute.is_none() {
                continue;
            }
            let expr = emission(input, vars, &limit.emission_type, d);
            if let Some(relative) = relative {
                model.add_row(
                    yearly_name("emission_relative", &limit.emission_type, d),
                    ConstraintFamily::Emission,
                    &expr,
                    Sense::Le,
                    relative,
                );
            }
            if let Some(absolute) = absolute {
                model.add_row(
                    yearly_name("emission_absolute", &limit.emission_type, d),
                    ConstraintFamily::Emission,
                    &expr,
                    Sense::Le,
                    absolute,
                );
            }
        }
    }
}

pub(super) fn add_fuel_availability(
    input: &OptimizationInputData,
    vars: &VariableRegistry,
    model: &mut LinearModel,
) {
    for (f, fuel) in input.fuels.iter().enumerate() {
        for d in 0..input.n_buckets() {
            let Some(available) = fuel.availability[d] else {
                continue;
            };
            let mut expr = LinearExpr::new();
            for (g, generator) in input.generators.iter().enumerate() {
                if generator.fuel.map(|burn| burn.fuel) != Some(f) {
                    continue;
                }
                if let Some(burned) = fuel_use(input, vars, g, d) {
                    expr.add_scaled(&burned, 1.0);
                }
            }
            model.add_row(
                yearly_name("fuel_availability", &fuel.name, d),
                ConstraintFamily::FuelAvailability,
                &expr,
                Sense::Le,
                available,
            );
        }
    }
}
