use super::expressions::{hourly_name, tagged_output, yearly_name, yearly_output};
use super::{ConstraintFamily, VariableRegistry};
use crate::input::{GenerationFractionInput, OptimizationInputData};
use crate::model::{LinearExpr, LinearModel, Sense};
use mep_core::FractionType;

/// `output(sub_tag) >= min * output(tag)` and `<= max * output(tag)`.
pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    for fraction in &input.generation_fractions {
        for d in 0..input.n_buckets() {
            match fraction.fraction_type {
                FractionType::Yearly => {
                    let all = 0..input.n_hours();
                    let tag = yearly_output(input, vars, &fraction.tag_units, d, all.clone());
                    let sub = yearly_output(input, vars, &fraction.sub_tag_units, d, all);
                    let name = yearly_name("gen_fraction", &fraction.name, d);
                    bounds(model, fraction, d, &tag, &sub, name);
                }
                FractionType::Hourly => {
                    for (i, &hour) in input.indices.hours.iter().enumerate() {
                        let tag = tagged_output(input, vars, &fraction.tag_units, d, i);
                        let sub = tagged_output(input, vars, &fraction.sub_tag_units, d, i);
                        let name = hourly_name("gen_fraction", &fraction.name, d, hour);
                        bounds(model, fraction, d, &tag, &sub, name);
                    }
                }
            }
        }
    }
}

fn bounds(
    model: &mut LinearModel,
    fraction: &GenerationFractionInput,
    d: usize,
    tag: &LinearExpr,
    sub: &LinearExpr,
    name: String,
) {
    if let Some(min) = fraction.min[d] {
        let mut expr = sub.clone();
        expr.add_scaled(tag, -min);
        model.add_row(
            format!("{name}_min"),
            ConstraintFamily::GenerationFraction,
            &expr,
            Sense::Ge,
            0.0,
        );
    }
    if let Some(max) = fraction.max[d] {
        let mut expr = sub.clone();
        expr.add_scaled(tag, -max);
        model.add_row(
            format!("{name}_max"),
            ConstraintFamily::GenerationFraction,
            &expr,
            Sense::Le,
            0.0,
        );
    }
}
