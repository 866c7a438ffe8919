use super::expressions::{demand, hourly_name};
use super::{ConstraintFamily, VariableRegistry};
use crate::input::OptimizationInputData;
use crate::model::{LinearExpr, LinearModel, Sense};

/// Supply equals demand at every bus, sampled hour and decision year.
///
/// Supply is generator output net of dumping and demand chunk deliveries,
/// line inflow after losses, storage discharge and energy not served. Demand is consumer demand
/// adjusted by DSR shifts, line outflow and storage charging. Buses with
/// nothing attached still get a `0 = 0` row.
pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    let tables = &input.indices.tables;
    for (b, bus) in input.buses.iter().enumerate() {
        for d in 0..input.n_buckets() {
            for (i, &hour) in input.indices.hours.iter().enumerate() {
                let mut expr = LinearExpr::new();

                for id in &tables.bus_generators[b] {
                    let generator = &input.generators[id.index()];
                    let gen_vars = &vars.generators[id.index()];
                    for (o, output) in generator.outputs.iter().enumerate() {
                        if output.bus != bus.id {
                            continue;
                        }
                        expr.add(gen_vars.gen[d][i], output.efficiency);
                        if let Some(dump) = &gen_vars.dump[o] {
                            expr.add(dump[d][i], -1.0);
                        }
                        for share in gen_vars.chunks.iter().filter(|share| share.output == o) {
                            expr.add(share.grid[d][i], -1.0);
                        }
                    }
                }

                for id in &tables.bus_lines_in[b] {
                    let line = &input.lines[id.index()];
                    expr.add(vars.flows[id.index()][d][i], 1.0 - line.transmission_loss);
                }
                for id in &tables.bus_lines_out[b] {
                    expr.add(vars.flows[id.index()][d][i], -1.0);
                }

                for id in &tables.bus_storages[b] {
                    let storage = &input.storages[id.index()];
                    let stor_vars = &vars.storages[id.index()];
                    expr.add(stor_vars.gen[d][i], storage.generation_efficiency);
                    expr.add(stor_vars.load[d][i], -1.0);
                    for share in &stor_vars.chunks {
                        expr.add(share.grid[d][i], -1.0);
                    }
                }

                if let Some(ens) = &vars.ens[b] {
                    expr.add(ens[d][i], 1.0);
                }

                expr.add_scaled(&demand(vars, bus, d, i), -1.0);
                if let (Some(minus), Some(plus)) = (&vars.shift_minus[b], &vars.shift_plus[b]) {
                    expr.add(minus[d][i], 1.0);
                    expr.add(plus[d][i], -1.0);
                }

                model.add_row(
                    hourly_name("balance", &bus.name, d, hour),
                    ConstraintFamily::Balance,
                    &expr,
                    Sense::Eq,
                    0.0,
                );
            }
        }
    }
}
