use super::expressions::hourly_name;
use super::{ConstraintFamily, VariableRegistry};
use crate::input::OptimizationInputData;
use crate::model::{LinearExpr, LinearModel, Sense};

pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    let hours = &input.indices.hours;
    for (generator, gen_vars) in input.generators.iter().zip(&vars.generators) {
        let name = generator.name.as_str();
        for d in 0..input.n_buckets() {
            let cap = gen_vars.capacity.cap[d];
            let utilization = generator.power_utilization[d];

            for (i, &hour) in hours.iter().enumerate() {
                let gen = gen_vars.gen[d][i];
                let mut expr = LinearExpr::new();
                expr.add(gen, 1.0);

                match &generator.capacity_factor {
                    None => {
                        for (_, reserve) in &gen_vars.reserve {
                            expr.add(reserve[d][i], 1.0);
                        }
                        expr.add(cap, -utilization);
                        model.add_row(
                            hourly_name("gen_max", name, d, hour),
                            ConstraintFamily::Generation,
                            &expr,
                            Sense::Le,
                            0.0,
                        );
                    }
                    Some(profile) => {
                        expr.add(cap, -profile[i] * utilization);
                        model.add_row(
                            hourly_name("gen_profile", name, d, hour),
                            ConstraintFamily::Generation,
                            &expr,
                            Sense::Eq,
                            0.0,
                        );
                    }
                }

                if let Some(minimum) = generator.minimal_power_utilization[d] {
                    let mut expr = LinearExpr::new();
                    expr.add(gen, 1.0).add(cap, -minimum);
                    model.add_row(
                        hourly_name("gen_min", name, d, hour),
                        ConstraintFamily::Generation,
                        &expr,
                        Sense::Ge,
                        0.0,
                    );
                }

                // Dumped and chunk-bound energy come out of the same output.
                let outputs = generator.outputs.iter().zip(&gen_vars.dump);
                for (o, (output, dump)) in outputs.enumerate() {
                    let mut expr = LinearExpr::new();
                    if let Some(dump) = dump {
                        expr.add(dump[d][i], 1.0);
                    }
                    for share in gen_vars.chunks.iter().filter(|share| share.output == o) {
                        expr.add(share.grid[d][i], 1.0);
                    }
                    if expr.is_empty() {
                        continue;
                    }
                    expr.add(gen, -output.efficiency);
                    model.add_row(
                        hourly_name(&format!("output_max_{}", output.energy_type), name, d, hour),
                        ConstraintFamily::Generation,
                        &expr,
                        Sense::Le,
                        0.0,
                    );
                }

                if i == 0 {
                    continue;
                }
                let previous = gen_vars.gen[d][i - 1];
                if let Some(ramp) = generator.ramp_up {
                    let mut expr = LinearExpr::new();
                    expr.add(gen, 1.0).add(previous, -1.0).add(cap, -ramp);
                    model.add_row(
                        hourly_name("ramp_up", name, d, hour),
                        ConstraintFamily::Generation,
                        &expr,
                        Sense::Le,
                        0.0,
                    );
                }
                if let Some(ramp) = generator.ramp_down {
                    let mut expr = LinearExpr::new();
                    expr.add(previous, 1.0).add(gen, -1.0).add(cap, -ramp);
                    model.add_row(
                        hourly_name("ramp_down", name, d, hour),
                        ConstraintFamily::Generation,
                        &expr,
                        Sense::Le,
                        0.0,
                    );
                }
            }
        }
    }
}
