//! Total discounted system cost.
//!
//! Every operating cost incurred in decision year `d` is weighted by the
//! sum of discount factors over the physical years of `d`. Investment cost
//! is spread evenly over the lifetime of a vintage and discounted over the
//! physical years the vintage is in service. Generation compensation
//! enters as a negative cost. Everything is divided by `money_scale`.

use super::expressions::fuel_use;
use super::{CapacityVars, VariableRegistry};
use crate::input::{CapacityInput, OptimizationInputData};
use crate::model::LinearExpr;

pub(super) fn expression(input: &OptimizationInputData, vars: &VariableRegistry) -> LinearExpr {
    let mut objective = LinearExpr::new();
    let money_scale = input.config.money_scale;
    let hour_weights = &input.indices.hour_weights;

    for (g, generator) in input.generators.iter().enumerate() {
        let gen_vars = &vars.generators[g];
        investment(
            &mut objective,
            input,
            &generator.capacity,
            &gen_vars.capacity,
            generator.cost_multiplier,
        );

        if let Some(compensation) = &generator.compensation {
            hourly_cost(&mut objective, input, &gen_vars.gen, |d| -compensation[d]);
        }
        if let Some(cost) = &generator.curtailment_cost {
            for grid in gen_vars.dump.iter().flatten() {
                hourly_cost(&mut objective, input, grid, |d| cost[d]);
            }
        }

        for d in 0..input.n_buckets() {
            let Some(burned) = fuel_use(input, vars, g, d) else {
                continue;
            };
            let fuel = generator.fuel.map(|burn| &input.fuels[burn.fuel]);
            let mut unit_cost = fuel.map(|f| f.cost[d]).unwrap_or(0.0);
            for &fee in &generator.emission_fees {
                let fee = &input.emission_fees[fee];
                let factor = fuel
                    .and_then(|f| f.emission.get(&fee.emission_type))
                    .copied()
                    .unwrap_or(0.0);
                unit_cost +=
                    factor * (1.0 - generator.reduction(&fee.emission_type, d)) * fee.price[d];
            }
            objective.add_scaled(&burned, unit_cost * input.year_weight(d));
        }
    }

    for (s, storage) in input.storages.iter().enumerate() {
        investment(&mut objective, input, &storage.capacity, &vars.storages[s].capacity, 1.0);
    }

    for (l, line) in input.lines.iter().enumerate() {
        let Some(fee) = &line.fee else { continue };
        for d in 0..input.n_buckets() {
            for (i, weight) in hour_weights.iter().enumerate() {
                objective.add(vars.flows[l][d][i], fee[i] * weight * input.year_weight(d));
            }
        }
    }

    if let Some(penalty) = input.config.ens_penalty_cost.filter(|_| input.ens_enabled()) {
        for grid in vars.ens.iter().flatten() {
            hourly_cost(&mut objective, input, grid, |_| penalty);
        }
    }

    for (b, bus) in input.buses.iter().enumerate() {
        let (Some(grid), Some(position)) = (&vars.shift_minus[b], bus.dsr) else {
            continue;
        };
        let penalization = input.dsr[position].penalization;
        if penalization != 0.0 {
            hourly_cost(&mut objective, input, grid, |_| penalization);
        }
    }

    tracing::trace!(terms = objective.terms().count(), money_scale, "objective assembled");
    objective
}

/// Capex on capacity built and opex on capacity installed.
fn investment(
    objective: &mut LinearExpr,
    input: &OptimizationInputData,
    capacity: &CapacityInput,
    vars: &CapacityVars,
    multiplier: f64,
) {
    let money_scale = input.config.money_scale;
    for d in 0..input.n_buckets() {
        objective.add(
            vars.cap_plus[d],
            capacity.capex[d] * multiplier * capacity.capex_discount[d] / money_scale,
        );
        objective.add(vars.cap[d], capacity.opex[d] * multiplier * input.year_weight(d));
    }
}

/// Hour-weighted cost of an hourly grid, `price` per decision year.
fn hourly_cost(
    objective: &mut LinearExpr,
    input: &OptimizationInputData,
    grid: &[Vec<crate::model::VarId>],
    price: impl Fn(usize) -> f64,
) {
    for (d, hours) in grid.iter().enumerate() {
        let price = price(d);
        for (&var, weight) in hours.iter().zip(&input.indices.hour_weights) {
            objective.add(var, price * weight * input.year_weight(d));
        }
    }
}
