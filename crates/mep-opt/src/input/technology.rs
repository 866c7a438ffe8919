//! Generator and storage parameters resolved per decision year.

use super::{lookup, Context};
use crate::aggregation::{per_bucket, per_bucket_optional, ParamKind};
use crate::error::OptResult;
use crate::indices::{Indices, YearBucket};
use indexmap::IndexMap;
use mep_core::{
    AggregateId, BusId, CapacityCost, CapacityLimits, Generator, GeneratorId, Storage, StorageId,
    TechnologyParams,
};

/// Capacity trajectory inputs shared by generators and storages.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityInput {
    pub base_capacity: f64,
    pub life_time: usize,
    pub build_time: usize,
    /// Whether the base capacity is still in service, per decision year
    pub base_alive: Vec<bool>,
    /// Vintages (decision years of construction) in service, per decision year
    pub vintages: Vec<Vec<usize>>,
    pub min_capacity: Vec<Option<f64>>,
    pub max_capacity: Vec<Option<f64>>,
    pub min_capacity_increase: Vec<Option<f64>>,
    pub max_capacity_increase: Vec<Option<f64>>,
    pub capex: Vec<f64>,
    pub opex: Vec<f64>,
    /// Discount factors over the service years of a vintage, spread over its lifetime
    pub capex_discount: Vec<f64>,
}

impl CapacityInput {
    fn new(
        params: &TechnologyParams,
        limits: CapacityLimits<'_>,
        base_capacity: f64,
        indices: &Indices,
        ctx: &Context,
    ) -> Self {
        let buckets = &indices.buckets;
        let life_time = params.life_time.max(1);
        let build_time = params.build_time;
        let levels = |series: &[Option<f64>]| {
            per_bucket_optional(series, buckets, ctx.method, ParamKind::Level)
        };
        let increments = |series: &[Option<f64>]| {
            per_bucket_optional(series, buckets, ctx.method, ParamKind::Increment)
        };

        Self {
            base_capacity,
            life_time,
            build_time,
            base_alive: buckets.iter().map(|b| b.start < life_time).collect(),
            vintages: buckets
                .iter()
                .map(|bucket| {
                    buckets
                        .iter()
                        .enumerate()
                        .filter(|(_, built)| in_service(built, bucket, build_time, life_time))
                        .map(|(vintage, _)| vintage)
                        .collect()
                })
                .collect(),
            min_capacity: levels(limits.min_capacity),
            max_capacity: levels(limits.max_capacity),
            min_capacity_increase: increments(limits.min_capacity_increase),
            max_capacity_increase: increments(limits.max_capacity_increase),
            capex: per_bucket(&params.capex, buckets, ctx.method, ParamKind::Price),
            opex: per_bucket(&params.opex, buckets, ctx.method, ParamKind::Price),
            capex_discount: buckets
                .iter()
                .map(|built| {
                    let first = built.start + build_time;
                    let last = (first + life_time).min(indices.n_years);
                    let total: f64 = indices
                        .discount_factors
                        .get(first..last)
                        .map(|df| df.iter().sum())
                        .unwrap_or(0.0);
                    total / life_time as f64
                })
                .collect(),
        }
    }
}

/// Capacity built in `built` serves physical years
/// `[start + build_time, start + build_time + life_time)`.
fn in_service(
    built: &YearBucket,
    bucket: &YearBucket,
    build_time: usize,
    life_time: usize,
) -> bool {
    let online = built.start + build_time;
    online <= bucket.end && online + life_time > bucket.start
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOutput {
    pub energy_type: String,
    pub bus: BusId,
    pub efficiency: f64,
}

/// Fuel burned by a generator, as an index into the fuel inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelUse {
    pub fuel: usize,
    pub energy_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorInput {
    pub id: GeneratorId,
    pub name: String,
    pub capacity: CapacityInput,
    pub outputs: Vec<GeneratorOutput>,
    /// Availability per sampled hour; `None` for dispatchable units
    pub capacity_factor: Option<Vec<f64>>,
    pub power_utilization: Vec<f64>,
    pub minimal_power_utilization: Vec<Option<f64>>,
    pub ramp_up: Option<f64>,
    pub ramp_down: Option<f64>,
    pub dump_energy: bool,
    pub fuel: Option<FuelUse>,
    /// emission type -> reduction per decision year
    pub emission_reduction: IndexMap<String, Vec<f64>>,
    /// Indices into the emission fee inputs
    pub emission_fees: Vec<usize>,
    pub reserves: Vec<String>,
    /// Capex/opex scale: first-output efficiency under netto costing
    pub cost_multiplier: f64,
    /// Credit per unit of generation, per decision year
    pub compensation: Option<Vec<f64>>,
    /// Cost per unit of dumped output, per decision year
    pub curtailment_cost: Option<Vec<f64>>,
    pub aggregate: Option<AggregateId>,
}

impl GeneratorInput {
    pub fn is_dispatchable(&self) -> bool {
        self.capacity_factor.is_none()
    }

    pub fn efficiency_for(&self, energy_type: &str) -> Option<f64> {
        self.outputs
            .iter()
            .find(|o| o.energy_type == energy_type)
            .map(|o| o.efficiency)
    }

    /// Emission reduction for `emission_type` in decision year `d`.
    pub fn reduction(&self, emission_type: &str, d: usize) -> f64 {
        self.emission_reduction
            .get(emission_type)
            .and_then(|series| series.get(d))
            .copied()
            .unwrap_or(0.0)
    }
}

pub(super) fn generator_input(
    position: usize,
    generator: &Generator,
    indices: &Indices,
    ctx: &Context,
) -> OptResult<GeneratorInput> {
    let network = ctx.network;
    let id = GeneratorId::new(position);
    let ty = lookup(&network.generator_types, &generator.generator_type, "generator type")?;
    let buses = &indices.tables.generator_buses[position];
    let buckets = &indices.buckets;

    // Outputs without a bus were reported by the validator; they carry no energy.
    let outputs: Vec<GeneratorOutput> = ty
        .efficiency
        .iter()
        .filter_map(|(energy_type, &efficiency)| {
            buses
                .iter()
                .copied()
                .find(|bus| network.buses[bus.index()].energy_type == *energy_type)
                .map(|bus| GeneratorOutput {
                    energy_type: energy_type.clone(),
                    bus,
                    efficiency,
                })
        })
        .collect();

    let capacity_factor = match &ty.capacity_factor {
        Some(name) => {
            let factor = lookup(&network.capacity_factors, name, "capacity factor")?;
            Some(ctx.hourly(&factor.profile, indices))
        }
        None => None,
    };

    let fuel = match &ty.fuel {
        Some(name) => {
            let position = network
                .fuels
                .position(name)
                .ok_or_else(|| ctx.error(format!("unknown fuel '{name}'")))?;
            Some(FuelUse {
                fuel: position,
                energy_per_unit: network.fuels[position].energy_per_unit,
            })
        }
        None => None,
    };

    let emission_fees = generator
        .emission_fees
        .iter()
        .map(|name| {
            network
                .emission_fees
                .position(name)
                .ok_or_else(|| ctx.error(format!("unknown emission fee '{name}'")))
        })
        .collect::<OptResult<Vec<_>>>()?;

    let yearly_price = |series: &[f64]| {
        (!series.is_empty()).then(|| per_bucket(series, buckets, ctx.method, ParamKind::Price))
    };

    let cost_multiplier = match ctx.capacity_cost {
        CapacityCost::Brutto => 1.0,
        CapacityCost::Netto => ty.efficiency.values().next().copied().unwrap_or(1.0),
    };

    Ok(GeneratorInput {
        id,
        name: generator.name.clone(),
        capacity: CapacityInput::new(
            &ty.params,
            generator.overrides.resolve(&ty.params),
            generator.unit_base_cap,
            indices,
            ctx,
        ),
        outputs,
        capacity_factor,
        power_utilization: per_bucket_optional(
            &ty.power_utilization,
            buckets,
            ctx.method,
            ParamKind::Level,
        )
        .into_iter()
        .map(|pu| pu.unwrap_or(1.0))
        .collect(),
        minimal_power_utilization: per_bucket_optional(
            &ty.minimal_power_utilization,
            buckets,
            ctx.method,
            ParamKind::Level,
        ),
        ramp_up: ty.ramp_up,
        ramp_down: ty.ramp_down,
        dump_energy: !ty.disable_dump_energy,
        fuel,
        emission_reduction: ty
            .emission_reduction
            .iter()
            .map(|(emission, series)| {
                (
                    emission.clone(),
                    per_bucket(series, buckets, ctx.method, ParamKind::Price),
                )
            })
            .collect(),
        emission_fees,
        reserves: generator.power_reserves.clone(),
        cost_multiplier,
        compensation: yearly_price(&ty.generation_compensation),
        curtailment_cost: yearly_price(&ty.energy_curtailment_cost),
        aggregate: indices.tables.generator_aggregate[position],
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageInput {
    pub id: StorageId,
    pub name: String,
    pub capacity: CapacityInput,
    pub bus: BusId,
    pub energy_type: String,
    pub generation_efficiency: f64,
    pub load_efficiency: f64,
    pub power_to_capacity: f64,
    pub energy_loss: f64,
    pub cycle_length: Option<usize>,
    pub reserves: Vec<String>,
    pub aggregate: Option<AggregateId>,
}

pub(super) fn storage_input(
    position: usize,
    storage: &Storage,
    indices: &Indices,
    ctx: &Context,
) -> OptResult<StorageInput> {
    let ty = lookup(&ctx.network.storage_types, &storage.storage_type, "storage type")?;
    Ok(StorageInput {
        id: StorageId::new(position),
        name: storage.name.clone(),
        capacity: CapacityInput::new(
            &ty.params,
            storage.overrides.resolve(&ty.params),
            storage.unit_base_cap,
            indices,
            ctx,
        ),
        bus: indices.tables.storage_bus[position],
        energy_type: ty.energy_type.clone(),
        generation_efficiency: ty.generation_efficiency,
        load_efficiency: ty.load_efficiency,
        power_to_capacity: ty.power_to_capacity,
        energy_loss: ty.energy_loss,
        cycle_length: ty.cycle_length.filter(|&len| len > 0),
        reserves: storage.power_reserves.clone(),
        aggregate: indices.tables.storage_aggregate[position],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(start: usize, end: usize) -> YearBucket {
        YearBucket {
            sampled_years: vec![start],
            start,
            end,
            discount_weight: (end - start + 1) as f64,
        }
    }

    #[test]
    fn service_window_is_keyed_to_physical_years() {
        let buckets = [bucket(0, 4), bucket(5, 9), bucket(10, 14)];
        // Built in the first bucket, online from year 1 for 6 years: [1, 7)
        assert!(in_service(&buckets[0], &buckets[0], 1, 6));
        assert!(in_service(&buckets[0], &buckets[1], 1, 6));
        assert!(!in_service(&buckets[0], &buckets[2], 1, 6));
        // Not online before it is built
        assert!(!in_service(&buckets[1], &buckets[0], 0, 50));
    }
}
