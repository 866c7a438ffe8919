use super::expressions::{demand, hourly_name, yearly_name};
use super::{ConstraintFamily, VariableRegistry};
use crate::input::OptimizationInputData;
use crate::model::{LinearExpr, LinearModel, Sense};
use indexmap::IndexMap;

/// Demand shifts balance within each period and stay within their limits.
///
/// Sampled hours are grouped into balancing periods by physical hour
/// (`hour / balancing_period_len`); within a period the recovered demand
/// equals the compensation factor times the shed demand.
pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    let hours = &input.indices.hours;
    for (b, bus) in input.buses.iter().enumerate() {
        let (Some(minus), Some(plus), Some(position)) =
            (&vars.shift_minus[b], &vars.shift_plus[b], bus.dsr)
        else {
            continue;
        };
        let dsr = &input.dsr[position];

        let mut periods: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for (i, &hour) in hours.iter().enumerate() {
            periods
                .entry(hour / dsr.balancing_period_len)
                .or_default()
                .push(i);
        }

        for d in 0..input.n_buckets() {
            for (period, members) in &periods {
                let mut expr = LinearExpr::new();
                for &i in members {
                    expr.add(plus[d][i], 1.0);
                    expr.add(minus[d][i], -dsr.compensation_factor);
                }
                model.add_row(
                    yearly_name("dsr_balance", &format!("{},{period}", bus.name), d),
                    ConstraintFamily::Dsr,
                    &expr,
                    Sense::Eq,
                    0.0,
                );
            }

            let Some(relative) = dsr.relative_shift_limit else {
                continue;
            };
            for (i, &hour) in hours.iter().enumerate() {
                let mut expr = LinearExpr::new();
                expr.add(minus[d][i], 1.0);
                expr.add_scaled(&demand(vars, bus, d, i), -relative);
                model.add_row(
                    hourly_name("dsr_limit", &bus.name, d, hour),
                    ConstraintFamily::Dsr,
                    &expr,
                    Sense::Le,
                    0.0,
                );
            }
        }
    }
}
