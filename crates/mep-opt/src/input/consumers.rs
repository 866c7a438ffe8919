//! Consumer aggregates, bus demand and demand-side response.

use super::{lookup, Context};
use crate::aggregation::{per_bucket, per_bucket_optional, ParamKind};
use crate::error::OptResult;
use crate::indices::Indices;
use mep_core::{AggregateId, AggregatedConsumer, BusId, Dsr, StackId};

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateInput {
    pub id: AggregateId,
    pub name: String,
    pub stacks: Vec<StackId>,
    pub stack_names: Vec<String>,
    /// Fraction fixed in the first decision year, per stack
    pub base_fraction: Vec<f64>,
    /// `[stack][decision year]`
    pub min_fraction: Vec<Vec<Option<f64>>>,
    pub max_fraction: Vec<Vec<Option<f64>>>,
    pub max_fraction_increase: Vec<Vec<Option<f64>>>,
    pub max_fraction_decrease: Vec<Vec<Option<f64>>>,
}

pub(super) fn aggregate_input(
    position: usize,
    aggregate: &AggregatedConsumer,
    indices: &Indices,
    ctx: &Context,
) -> AggregateInput {
    let buckets = &indices.buckets;
    let stack_names: Vec<String> = aggregate.stacks().map(str::to_string).collect();
    let per_stack = |bounds: &indexmap::IndexMap<String, mep_core::YearSeries>, kind| {
        stack_names
            .iter()
            .map(|stack| match bounds.get(stack) {
                Some(series) => per_bucket_optional(series, buckets, ctx.method, kind),
                None => vec![None; buckets.len()],
            })
            .collect::<Vec<_>>()
    };

    AggregateInput {
        id: AggregateId::new(position),
        name: aggregate.name.clone(),
        stacks: indices.tables.aggregate_stacks[position].clone(),
        base_fraction: aggregate.stack_base_fraction.values().copied().collect(),
        min_fraction: per_stack(&aggregate.min_fraction, ParamKind::Level),
        max_fraction: per_stack(&aggregate.max_fraction, ParamKind::Level),
        max_fraction_increase: per_stack(&aggregate.max_fraction_increase, ParamKind::Increment),
        max_fraction_decrease: per_stack(&aggregate.max_fraction_decrease, ParamKind::Increment),
        stack_names,
    }
}

/// Demand of one aggregate placed on a bus through one of its stacks.
///
/// Hourly demand is `fraction[aggregate, stack, d] * yearly[d] * profile[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandTerm {
    /// Position in the aggregate inputs
    pub aggregate: usize,
    /// Position of the stack within the aggregate
    pub slot: usize,
    /// Usage times number of consumers, per decision year
    pub yearly: Vec<f64>,
    /// Normalized profile per sampled hour
    pub profile: Vec<f64>,
}

impl DemandTerm {
    pub fn coefficient(&self, i: usize, d: usize) -> f64 {
        self.yearly[d] * self.profile[i]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusInput {
    pub id: BusId,
    pub name: String,
    pub energy_type: String,
    pub demand: Vec<DemandTerm>,
    /// Index into the DSR inputs
    pub dsr: Option<usize>,
}

impl BusInput {
    pub fn has_demand(&self) -> bool {
        !self.demand.is_empty()
    }
}

pub(super) fn bus_inputs(
    aggregates: &[AggregateInput],
    indices: &Indices,
    ctx: &Context,
) -> OptResult<Vec<BusInput>> {
    let network = ctx.network;
    let mut buses: Vec<BusInput> = network
        .buses
        .iter()
        .enumerate()
        .map(|(position, bus)| {
            let dsr = match &bus.dsr_type {
                Some(name) => Some(
                    network
                        .dsr
                        .position(name)
                        .ok_or_else(|| ctx.error(format!("unknown DSR '{name}'")))?,
                ),
                None => None,
            };
            Ok(BusInput {
                id: BusId::new(position),
                name: bus.name.clone(),
                energy_type: bus.energy_type.clone(),
                demand: Vec::new(),
                dsr,
            })
        })
        .collect::<OptResult<_>>()?;

    for (a, aggregate) in network.aggregated_consumers.iter().enumerate() {
        let profile = lookup(
            &network.demand_profiles,
            &aggregate.demand_profile,
            "demand profile",
        )?;
        let consumers = per_bucket(
            &aggregate.n_consumers,
            &indices.buckets,
            ctx.method,
            ParamKind::Price,
        );
        for (slot, &stack) in aggregates[a].stacks.iter().enumerate() {
            let stack_record = &network.local_balancing_stacks[stack.index()];
            for (energy_type, bus_name) in &stack_record.buses {
                let (Some(usage), Some(shape)) = (
                    aggregate.yearly_energy_usage.get(energy_type),
                    profile.normalized_profile.get(energy_type),
                ) else {
                    continue;
                };
                let bus = network
                    .buses
                    .position(bus_name)
                    .ok_or_else(|| ctx.error(format!("unknown bus '{bus_name}'")))?;
                let usage = per_bucket(usage, &indices.buckets, ctx.method, ParamKind::Price);
                buses[bus].demand.push(DemandTerm {
                    aggregate: a,
                    slot,
                    yearly: usage.iter().zip(&consumers).map(|(u, n)| u * n).collect(),
                    profile: ctx.hourly(shape, indices),
                });
            }
        }
    }
    Ok(buses)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DsrInput {
    pub name: String,
    pub compensation_factor: f64,
    pub balancing_period_len: usize,
    pub penalization: f64,
    pub relative_shift_limit: Option<f64>,
    pub abs_shift_limit: Option<f64>,
}

impl From<&Dsr> for DsrInput {
    fn from(dsr: &Dsr) -> Self {
        Self {
            name: dsr.name.clone(),
            compensation_factor: dsr.compensation_factor,
            balancing_period_len: dsr.balancing_period_len.max(1),
            penalization: dsr.penalization,
            relative_shift_limit: dsr.relative_shift_limit,
            abs_shift_limit: dsr.abs_shift_limit,
        }
    }
}
