//! Transmission, fuels, emissions and the policy records that tie units together.

use super::{Context, GeneratorInput, StorageInput};
use crate::aggregation::{aggregate, per_bucket, per_bucket_optional, ParamKind};
use crate::error::OptResult;
use crate::indices::Indices;
use indexmap::IndexMap;
use mep_core::{
    BoundSense, BusId, CapacityBound, DemandChunk, FractionType, GeneratorId,
    GenerationFraction, Line, StorageId, TechnologyRef,
};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct LineInput {
    pub name: String,
    pub from: BusId,
    pub to: BusId,
    pub transmission_loss: f64,
    pub max_capacity: f64,
    /// Fee per sampled hour
    pub fee: Option<Vec<f64>>,
}

pub(super) fn line_input(line: &Line, indices: &Indices, ctx: &Context) -> OptResult<LineInput> {
    let network = ctx.network;
    let bus = |name: &str| {
        network
            .buses
            .position(name)
            .map(BusId::new)
            .ok_or_else(|| {
                ctx.error(format!("line '{}' references unknown bus '{name}'", line.name))
            })
    };
    let fee = match &line.transmission_fee {
        Some(name) => {
            let fee = super::lookup(&network.transmission_fees, name, "transmission fee")?;
            Some(ctx.hourly(&fee.fee, indices))
        }
        None => None,
    };
    Ok(LineInput {
        name: line.name.clone(),
        from: bus(&line.from)?,
        to: bus(&line.to)?,
        transmission_loss: line.transmission_loss,
        max_capacity: line.max_capacity,
        fee,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuelInput {
    pub name: String,
    pub energy_per_unit: f64,
    /// Price per unit, per decision year
    pub cost: Vec<f64>,
    pub availability: Vec<Option<f64>>,
    pub emission: IndexMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFeeInput {
    pub name: String,
    pub emission_type: String,
    pub price: Vec<f64>,
}

/// Emission caps per decision year, both already in absolute units.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionLimitInput {
    pub emission_type: String,
    pub relative: Vec<Option<f64>>,
    pub absolute: Vec<Option<f64>>,
}

pub(super) fn fuel_inputs(indices: &Indices, ctx: &Context) -> Vec<FuelInput> {
    ctx.network
        .fuels
        .iter()
        .map(|fuel| FuelInput {
            name: fuel.name.clone(),
            energy_per_unit: fuel.energy_per_unit,
            cost: per_bucket(&fuel.cost, &indices.buckets, ctx.method, ParamKind::Price),
            availability: per_bucket_optional(
                &fuel.availability,
                &indices.buckets,
                ctx.method,
                ParamKind::Price,
            ),
            emission: fuel.emission.clone(),
        })
        .collect()
}

pub(super) fn emission_fee_inputs(indices: &Indices, ctx: &Context) -> Vec<EmissionFeeInput> {
    ctx.network
        .emission_fees
        .iter()
        .map(|fee| EmissionFeeInput {
            name: fee.name.clone(),
            emission_type: fee.emission_type.clone(),
            price: per_bucket(&fee.price, &indices.buckets, ctx.method, ParamKind::Price),
        })
        .collect()
}

pub(super) fn emission_limit_inputs(indices: &Indices, ctx: &Context) -> Vec<EmissionLimitInput> {
    let constants = &ctx.network.constants;
    let limits = |series: Option<&Vec<Option<f64>>>| match series {
        Some(series) => {
            per_bucket_optional(series, &indices.buckets, ctx.method, ParamKind::Level)
        }
        None => vec![None; indices.n_buckets()],
    };
    ctx.network
        .emission_types
        .iter()
        .filter_map(|emission| {
            let base = constants.base_total_emission.get(emission).copied();
            let relative_limits = constants.relative_emission_limits.get(emission);
            let relative: Vec<Option<f64>> = limits(relative_limits)
                .into_iter()
                .map(|limit| limit.zip(base).map(|(fraction, base)| fraction * base))
                .collect();
            let absolute = limits(constants.absolute_emission_limits.get(emission));
            if relative.iter().chain(&absolute).all(Option::is_none) {
                return None;
            }
            Some(EmissionLimitInput {
                emission_type: emission.clone(),
                relative,
                absolute,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReserveInput {
    pub key: String,
    pub energy_type: String,
    pub fraction: f64,
    /// Dispatchable generators contributing headroom
    pub generators: Vec<GeneratorId>,
    pub storages: Vec<StorageId>,
}

pub(super) fn reserve_inputs(
    generators: &[GeneratorInput],
    storages: &[StorageInput],
    ctx: &Context,
) -> Vec<ReserveInput> {
    ctx.network
        .constants
        .power_reserves
        .iter()
        .map(|(key, reserve)| ReserveInput {
            key: key.clone(),
            energy_type: reserve.energy_type.clone(),
            fraction: reserve.fraction,
            generators: generators
                .iter()
                .filter(|g| g.is_dispatchable() && g.reserves.contains(key))
                .map(|g| g.id)
                .collect(),
            storages: storages
                .iter()
                .filter(|s| s.reserves.contains(key))
                .map(|s| s.id)
                .collect(),
        })
        .collect()
}

/// Units carrying a tag, restricted to those delivering one energy type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedUnits {
    /// Generator with its efficiency into the energy type
    pub generators: Vec<(GeneratorId, f64)>,
    pub storages: Vec<StorageId>,
}

impl TaggedUnits {
    fn collect(
        tag: &str,
        energy_type: &str,
        generators: &[GeneratorInput],
        storages: &[StorageInput],
        indices: &Indices,
    ) -> Self {
        let tables = &indices.tables;
        Self {
            generators: tables
                .generator_tags
                .get(tag)
                .into_iter()
                .flatten()
                .filter_map(|id| {
                    generators[id.index()]
                        .efficiency_for(energy_type)
                        .map(|efficiency| (*id, efficiency))
                })
                .collect(),
            storages: tables
                .storage_tags
                .get(tag)
                .into_iter()
                .flatten()
                .filter(|id| storages[id.index()].energy_type == energy_type)
                .copied()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty() && self.storages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPeriod {
    pub start: usize,
    pub end: usize,
    /// Positions in the hour sample that fall inside `[start, end)`
    pub hours: Vec<usize>,
    pub demand: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkInput {
    pub name: String,
    pub energy_type: String,
    pub units: TaggedUnits,
    pub periods: Vec<ChunkPeriod>,
}

pub(super) fn chunk_input(
    chunk: &DemandChunk,
    generators: &[GeneratorInput],
    storages: &[StorageInput],
    indices: &Indices,
    ctx: &Context,
) -> ChunkInput {
    let mut periods = Vec::new();
    for (p, &(start, end)) in chunk.periods.iter().enumerate() {
        let hours: Vec<usize> = indices
            .hours
            .iter()
            .enumerate()
            .filter(|(_, hour)| (start..end).contains(*hour))
            .map(|(i, _)| i)
            .collect();
        if hours.is_empty() {
            warn!(
                chunk = %chunk.name,
                period = p,
                "no sampled hour falls in [{start}, {end}); period skipped"
            );
            continue;
        }
        let series = chunk.demand.get(p).map(Vec::as_slice).unwrap_or_default();
        periods.push(ChunkPeriod {
            start,
            end,
            hours,
            demand: indices
                .buckets
                .iter()
                .map(|bucket| aggregate(series, bucket, ctx.method, ParamKind::Price))
                .collect(),
        });
    }
    ChunkInput {
        name: chunk.name.clone(),
        energy_type: chunk.energy_type.clone(),
        units: TaggedUnits::collect(&chunk.tag, &chunk.energy_type, generators, storages, indices),
        periods,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRef {
    Generator(GeneratorId),
    Storage(StorageId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapacityBoundInput {
    pub name: String,
    pub sense: BoundSense,
    pub left_coefficient: f64,
    pub left: Vec<UnitRef>,
    pub right: Vec<UnitRef>,
}

pub(super) fn capacity_bound_input(
    bound: &CapacityBound,
    generators: &[GeneratorInput],
    storages: &[StorageInput],
    ctx: &Context,
) -> OptResult<CapacityBoundInput> {
    let network = ctx.network;
    let (left_unit, right_unit) = (
        network.capacity_unit(&bound.left),
        network.capacity_unit(&bound.right),
    );
    match (left_unit, right_unit) {
        (Some(left), Some(right)) if left != right => {
            return Err(ctx.error(format!(
                "capacity bound '{}' compares {} with {}; capacity units differ",
                bound.name, bound.left, bound.right
            )))
        }
        (Some(_), Some(_)) => {}
        _ => {
            return Err(ctx.error(format!(
                "capacity bound '{}' references an unknown technology",
                bound.name
            )))
        }
    }

    let scope = match &bound.aggregate {
        Some(name) => Some(network.aggregated_consumers.position(name).ok_or_else(|| {
            ctx.error(format!(
                "capacity bound '{}' references unknown aggregate '{name}'",
                bound.name
            ))
        })?),
        None => None,
    };
    let in_scope = |aggregate: Option<mep_core::AggregateId>| match scope {
        Some(position) => aggregate.map(|a| a.index()) == Some(position),
        None => true,
    };

    let resolve = |reference: &TechnologyRef| -> Vec<UnitRef> {
        match reference {
            TechnologyRef::Generator(name) => network
                .generators
                .position(name)
                .map(|p| UnitRef::Generator(GeneratorId::new(p)))
                .into_iter()
                .collect(),
            TechnologyRef::Storage(name) => network
                .storages
                .position(name)
                .map(|p| UnitRef::Storage(StorageId::new(p)))
                .into_iter()
                .collect(),
            TechnologyRef::GeneratorType(ty) => network
                .generators
                .iter()
                .zip(generators)
                .filter(|(record, input)| record.generator_type == *ty && in_scope(input.aggregate))
                .map(|(_, input)| UnitRef::Generator(input.id))
                .collect(),
            TechnologyRef::StorageType(ty) => network
                .storages
                .iter()
                .zip(storages)
                .filter(|(record, input)| record.storage_type == *ty && in_scope(input.aggregate))
                .map(|(_, input)| UnitRef::Storage(input.id))
                .collect(),
        }
    };

    Ok(CapacityBoundInput {
        name: bound.name.clone(),
        sense: bound.sense,
        left_coefficient: bound.left_coefficient,
        left: resolve(&bound.left),
        right: resolve(&bound.right),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationFractionInput {
    pub name: String,
    pub energy_type: String,
    pub fraction_type: FractionType,
    pub tag_units: TaggedUnits,
    pub sub_tag_units: TaggedUnits,
    pub min: Vec<Option<f64>>,
    pub max: Vec<Option<f64>>,
}

pub(super) fn generation_fraction_input(
    fraction: &GenerationFraction,
    generators: &[GeneratorInput],
    storages: &[StorageInput],
    indices: &Indices,
    ctx: &Context,
) -> GenerationFractionInput {
    let units = |tag: &str| {
        TaggedUnits::collect(tag, &fraction.energy_type, generators, storages, indices)
    };
    let bounds = |series: &[Option<f64>]| {
        per_bucket_optional(series, &indices.buckets, ctx.method, ParamKind::Level)
    };
    GenerationFractionInput {
        name: fraction.name.clone(),
        energy_type: fraction.energy_type.clone(),
        fraction_type: fraction.fraction_type,
        tag_units: units(&fraction.tag),
        sub_tag_units: units(&fraction.sub_tag),
        min: bounds(&fraction.min_generation_fraction),
        max: bounds(&fraction.max_generation_fraction),
    }
}

