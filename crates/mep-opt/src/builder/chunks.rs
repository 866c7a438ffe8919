use super::expressions::yearly_name;
use super::{ConstraintFamily, VariableRegistry};
use crate::input::OptimizationInputData;
use crate::model::{LinearExpr, LinearModel, Sense};

/// Chunk deliveries of the tagged units inside each period meet the chunk demand.
///
/// Deliveries are taken out of the units' bus injection, so chunk demand
/// comes on top of the ordinary bus demand.
pub(super) fn add(input: &OptimizationInputData, vars: &VariableRegistry, model: &mut LinearModel) {
    let weights = &input.indices.hour_weights;
    let shares = vars
        .generators
        .iter()
        .flat_map(|g| &g.chunks)
        .chain(vars.storages.iter().flat_map(|s| &s.chunks));

    for (c, chunk) in input.chunks.iter().enumerate() {
        for period in &chunk.periods {
            let entity = format!("{},{}-{}", chunk.name, period.start, period.end);
            for d in 0..input.n_buckets() {
                let mut expr = LinearExpr::new();
                for share in shares.clone().filter(|share| share.chunk == c) {
                    for &i in &period.hours {
                        expr.add(share.grid[d][i], weights[i]);
                    }
                }
                model.add_row(
                    yearly_name("chunk", &entity, d),
                    ConstraintFamily::DemandChunk,
                    &expr,
                    Sense::Eq,
                    period.demand[d],
                );
            }
        }
    }
}
