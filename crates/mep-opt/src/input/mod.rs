//! Optimization input data.
//!
//! [`OptimizationInputData`] is the validated network flattened into plain
//! per-decision-year parameters: every name is resolved to a position,
//! every year series is aggregated onto buckets and every hourly profile is
//! cut down to the hour sample. Constraint families read nothing else.

mod consumers;
mod scenario;
mod technology;

pub use consumers::{AggregateInput, BusInput, DemandTerm, DsrInput};
pub use scenario::{
    CapacityBoundInput, ChunkInput, ChunkPeriod, EmissionFeeInput, EmissionLimitInput, FuelInput,
    GenerationFractionInput, LineInput, ReserveInput, TaggedUnits, UnitRef,
};
pub use technology::{CapacityInput, FuelUse, GeneratorInput, GeneratorOutput, StorageInput};

use crate::error::{OptError, OptResult};
use crate::indices::Indices;
use mep_core::{
    AggregationMethod, CapacityCost, ElementArena, NetworkElement, OptimizationConfig,
    ValidatedNetwork,
};
use tracing::debug;

/// Shared state while flattening one network.
pub(crate) struct Context<'a> {
    pub network: &'a ValidatedNetwork,
    pub method: AggregationMethod,
    pub capacity_cost: CapacityCost,
}

impl Context<'_> {
    pub fn error(&self, message: String) -> OptError {
        OptError::ModelConstruction(message)
    }

    /// Profile values at the sampled hours; missing hours read as zero.
    pub fn hourly(&self, profile: &[f64], indices: &Indices) -> Vec<f64> {
        indices
            .hours
            .iter()
            .map(|&h| profile.get(h).copied().unwrap_or(0.0))
            .collect()
    }
}

pub(crate) fn lookup<'a, T: NetworkElement>(
    arena: &'a ElementArena<T>,
    name: &str,
    kind: &str,
) -> OptResult<&'a T> {
    arena
        .get(name)
        .ok_or_else(|| OptError::ModelConstruction(format!("unknown {kind} '{name}'")))
}

#[derive(Debug, Clone)]
pub struct OptimizationInputData {
    pub config: OptimizationConfig,
    pub indices: Indices,
    pub buses: Vec<BusInput>,
    pub lines: Vec<LineInput>,
    pub generators: Vec<GeneratorInput>,
    pub storages: Vec<StorageInput>,
    pub aggregates: Vec<AggregateInput>,
    pub dsr: Vec<DsrInput>,
    pub fuels: Vec<FuelInput>,
    pub emission_fees: Vec<EmissionFeeInput>,
    pub emission_limits: Vec<EmissionLimitInput>,
    pub reserves: Vec<ReserveInput>,
    pub chunks: Vec<ChunkInput>,
    pub capacity_bounds: Vec<CapacityBoundInput>,
    pub generation_fractions: Vec<GenerationFractionInput>,
}

impl OptimizationInputData {
    pub fn new(
        network: &ValidatedNetwork,
        indices: Indices,
        config: OptimizationConfig,
    ) -> OptResult<Self> {
        let ctx = Context {
            network,
            method: config.aggregation_method,
            capacity_cost: config.generator_capacity_cost,
        };

        let generators = network
            .generators
            .iter()
            .enumerate()
            .map(|(position, generator)| {
                technology::generator_input(position, generator, &indices, &ctx)
            })
            .collect::<OptResult<Vec<_>>>()?;
        let storages = network
            .storages
            .iter()
            .enumerate()
            .map(|(position, storage)| technology::storage_input(position, storage, &indices, &ctx))
            .collect::<OptResult<Vec<_>>>()?;
        let aggregates: Vec<AggregateInput> = network
            .aggregated_consumers
            .iter()
            .enumerate()
            .map(|(position, aggregate)| {
                consumers::aggregate_input(position, aggregate, &indices, &ctx)
            })
            .collect();
        let buses = consumers::bus_inputs(&aggregates, &indices, &ctx)?;
        let lines = network
            .lines
            .iter()
            .map(|line| scenario::line_input(line, &indices, &ctx))
            .collect::<OptResult<Vec<_>>>()?;
        let capacity_bounds = network
            .capacity_bounds
            .iter()
            .map(|bound| scenario::capacity_bound_input(bound, &generators, &storages, &ctx))
            .collect::<OptResult<Vec<_>>>()?;
        let chunks = network
            .demand_chunks
            .iter()
            .map(|chunk| scenario::chunk_input(chunk, &generators, &storages, &indices, &ctx))
            .collect();
        let generation_fractions = network
            .generation_fractions
            .iter()
            .map(|fraction| {
                scenario::generation_fraction_input(
                    fraction,
                    &generators,
                    &storages,
                    &indices,
                    &ctx,
                )
            })
            .collect();

        let data = Self {
            dsr: network.dsr.iter().map(DsrInput::from).collect(),
            fuels: scenario::fuel_inputs(&indices, &ctx),
            emission_fees: scenario::emission_fee_inputs(&indices, &ctx),
            emission_limits: scenario::emission_limit_inputs(&indices, &ctx),
            reserves: scenario::reserve_inputs(&generators, &storages, &ctx),
            buses,
            lines,
            generators,
            storages,
            aggregates,
            chunks,
            capacity_bounds,
            generation_fractions,
            indices,
            config,
        };
        debug!(
            buses = data.buses.len(),
            generators = data.generators.len(),
            storages = data.storages.len(),
            buckets = data.indices.n_buckets(),
            "optimization input assembled"
        );
        Ok(data)
    }

    pub fn n_buckets(&self) -> usize {
        self.indices.n_buckets()
    }

    pub fn n_hours(&self) -> usize {
        self.indices.n_sampled_hours()
    }

    /// Whether energy-not-served variables are created.
    pub fn ens_enabled(&self) -> bool {
        self.config.ens_enabled()
    }

    /// Money weight of decision year `d`: discounted years over money scale.
    pub fn year_weight(&self, d: usize) -> f64 {
        self.indices.buckets[d].discount_weight / self.config.money_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::{build_indices, Sampling};
    use mep_core::*;

    fn network() -> ValidatedNetwork {
        let mut network = Network::new(NetworkConstants::new(4, 2))
            .with_energy_types(["electricity"]);
        network.add_bus(Bus::new("EE", "electricity")).unwrap();
        let mut params = TechnologyParams::flat(2, 4, 10.0, 1.0);
        params.max_capacity = vec![Some(5.0), Some(6.0), Some(7.0), Some(8.0)];
        params.capex = vec![10.0, 20.0, 30.0, 40.0];
        network
            .add_generator_type(GeneratorType::new("gas", params).with_output("electricity", 0.5))
            .unwrap();
        network
            .add_generator(Generator::new("PP", "gas").with_bus("EE").with_base_capacity(3.0))
            .unwrap();
        network.into_validated(ValidationMode::Strict).unwrap()
    }

    fn input(config: OptimizationConfig) -> OptimizationInputData {
        let network = network();
        let indices = build_indices(&network, &Sampling::full(4, 2, 0.0), &config).unwrap();
        OptimizationInputData::new(&network, indices, config).unwrap()
    }

    #[test]
    fn parameters_follow_aggregation_method() {
        let last = input(OptimizationConfig {
            n_years_aggregation: 2,
            ..OptimizationConfig::default()
        });
        let capacity = &last.generators[0].capacity;
        assert_eq!(capacity.max_capacity, vec![Some(6.0), Some(8.0)]);
        assert_eq!(capacity.capex, vec![20.0, 40.0]);

        let combined = input(OptimizationConfig {
            n_years_aggregation: 2,
            aggregation_method: AggregationMethod::Combined,
            ..OptimizationConfig::default()
        });
        let capacity = &combined.generators[0].capacity;
        assert_eq!(capacity.max_capacity, vec![Some(6.0), Some(8.0)]);
        assert_eq!(capacity.capex, vec![15.0, 35.0]);
    }

    #[test]
    fn base_capacity_retires_with_physical_years() {
        let data = input(OptimizationConfig::default());
        let capacity = &data.generators[0].capacity;
        assert_eq!(capacity.base_alive, vec![true, true, false, false]);
        assert_eq!(capacity.vintages[2], vec![1, 2]);
        // Undiscounted: two service years spread over a lifetime of two.
        assert_eq!(capacity.capex_discount[0], 1.0);
        assert_eq!(capacity.capex_discount[3], 0.5);
    }

    #[test]
    fn netto_costs_scale_by_first_efficiency() {
        let brutto = input(OptimizationConfig::default());
        assert_eq!(brutto.generators[0].cost_multiplier, 1.0);
        let netto = input(OptimizationConfig {
            generator_capacity_cost: CapacityCost::Netto,
            ..OptimizationConfig::default()
        });
        assert_eq!(netto.generators[0].cost_multiplier, 0.5);
        assert!(netto.generators[0].dump_energy);
    }
}
