//! Optimization indices.
//!
//! [`build_indices`] turns the sampling vectors into the index sets used by
//! every constraint family: sampled hours with their weights, decision
//! years (buckets of sampled years) with their discount weights, and the
//! lookup tables that relate buses, units, stacks and aggregates.

use indexmap::IndexMap;
use mep_core::{
    AggregateId, BusId, GeneratorId, GeneratorTypeId, LineId, OptimizationConfig, StackId,
    StorageId, StorageTypeId, ValidatedNetwork,
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::debug;

/// Scenario sampling supplied alongside the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    /// Strictly increasing subset of `[0, n_hours)`
    pub hour_sample: Vec<usize>,
    /// Strictly increasing subset of `[0, n_years)`
    pub year_sample: Vec<usize>,
    /// Yearly discount rate for every physical year
    pub discount_rate: Vec<f64>,
}

impl Sampling {
    /// Every hour and year, constant discount rate.
    pub fn full(n_years: usize, n_hours: usize, discount_rate: f64) -> Self {
        Self {
            hour_sample: (0..n_hours).collect(),
            year_sample: (0..n_years).collect(),
            discount_rate: vec![discount_rate; n_years],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Hour,
    Year,
}

impl std::fmt::Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleKind::Hour => write!(f, "hour"),
            SampleKind::Year => write!(f, "year"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("{kind} sample is empty")]
    EmptySample { kind: SampleKind },

    #[error("{kind} sample entry {value} is outside [0, {limit})")]
    OutOfRange {
        kind: SampleKind,
        value: usize,
        limit: usize,
    },

    #[error("{kind} sample is not strictly increasing at position {position}")]
    NotIncreasing { kind: SampleKind, position: usize },

    #[error("n_years_aggregation must be at least 1")]
    ZeroAggregation,

    #[error("discount_rate has {len} entries, expected one per year ({expected})")]
    DiscountLength { len: usize, expected: usize },
}

/// One decision year: a group of consecutive sampled years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearBucket {
    /// Sampled physical years in this bucket
    pub sampled_years: Vec<usize>,
    /// First physical year represented (the first sampled year)
    pub start: usize,
    /// Last physical year represented, inclusive
    pub end: usize,
    /// Sum of discount factors over `start..=end`
    pub discount_weight: f64,
}

impl YearBucket {
    pub fn physical_years(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn last_sampled(&self) -> usize {
        self.sampled_years.last().copied().unwrap_or(self.start)
    }

    pub fn contains(&self, year: usize) -> bool {
        self.physical_years().contains(&year)
    }
}

/// Relations between network elements, resolved once to positions.
#[derive(Debug, Clone, Default)]
pub struct NetworkTables {
    pub bus_generators: Vec<Vec<GeneratorId>>,
    pub bus_storages: Vec<Vec<StorageId>>,
    pub bus_lines_in: Vec<Vec<LineId>>,
    pub bus_lines_out: Vec<Vec<LineId>>,
    /// Output buses of every generator, in the order of `Generator::buses`
    pub generator_buses: Vec<Vec<BusId>>,
    pub generator_type: Vec<GeneratorTypeId>,
    pub storage_bus: Vec<BusId>,
    pub storage_type: Vec<StorageTypeId>,
    /// Buses of every stack, in slot order
    pub stack_buses: Vec<Vec<BusId>>,
    /// Stacks of every aggregate, in base-fraction order
    pub aggregate_stacks: Vec<Vec<StackId>>,
    pub stack_aggregate: Vec<Option<AggregateId>>,
    pub buses_by_energy_type: IndexMap<String, Vec<BusId>>,
    /// Aggregate served by a unit through one of its buses
    pub generator_aggregate: Vec<Option<AggregateId>>,
    pub storage_aggregate: Vec<Option<AggregateId>>,
    pub generator_tags: IndexMap<String, Vec<GeneratorId>>,
    pub storage_tags: IndexMap<String, Vec<StorageId>>,
}

/// Index sets of one optimization run.
#[derive(Debug, Clone)]
pub struct Indices {
    pub n_years: usize,
    pub n_hours: usize,
    pub hours: Vec<usize>,
    pub hour_weights: Vec<f64>,
    pub years: Vec<usize>,
    /// Physical years each sampled year stands for
    pub year_weights: Vec<f64>,
    pub buckets: Vec<YearBucket>,
    /// Cumulative discount factor of every physical year
    pub discount_factors: Vec<f64>,
    pub tables: NetworkTables,
}

impl Indices {
    pub fn n_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn n_sampled_hours(&self) -> usize {
        self.hours.len()
    }

    /// Bucket holding a physical year, if that year is represented.
    pub fn bucket_of_year(&self, year: usize) -> Option<usize> {
        self.buckets.iter().position(|b| b.contains(year))
    }
}

fn check_sample(sample: &[usize], limit: usize, kind: SampleKind) -> Result<(), IndexError> {
    if sample.is_empty() {
        return Err(IndexError::EmptySample { kind });
    }
    for (position, &value) in sample.iter().enumerate() {
        if value >= limit {
            return Err(IndexError::OutOfRange { kind, value, limit });
        }
        if position > 0 && sample[position - 1] >= value {
            return Err(IndexError::NotIncreasing { kind, position });
        }
    }
    Ok(())
}

/// `df[p] = prod_{q <= p} 1 / (1 + r[q])`
pub fn discount_factors(rates: &[f64]) -> Vec<f64> {
    let mut factor = 1.0;
    rates
        .iter()
        .map(|rate| {
            factor /= 1.0 + rate;
            factor
        })
        .collect()
}

fn year_buckets(
    years: &[usize],
    n_years: usize,
    k: usize,
    discount: &[f64],
) -> Vec<YearBucket> {
    let groups: Vec<&[usize]> = years.chunks(k).collect();
    groups
        .iter()
        .enumerate()
        .map(|(d, group)| {
            let start = group[0];
            let end = groups
                .get(d + 1)
                .map(|next| next[0] - 1)
                .unwrap_or(n_years - 1);
            YearBucket {
                sampled_years: group.to_vec(),
                start,
                end,
                discount_weight: discount[start..=end].iter().sum(),
            }
        })
        .collect()
}

/// Resolve sampling, aggregation and lookup tables for a validated network.
pub fn build_indices(
    network: &ValidatedNetwork,
    sampling: &Sampling,
    config: &OptimizationConfig,
) -> Result<Indices, IndexError> {
    let n_years = network.n_years();
    let n_hours = network.n_hours();
    check_sample(&sampling.hour_sample, n_hours, SampleKind::Hour)?;
    check_sample(&sampling.year_sample, n_years, SampleKind::Year)?;
    if config.n_years_aggregation == 0 {
        return Err(IndexError::ZeroAggregation);
    }
    if sampling.discount_rate.len() != n_years {
        return Err(IndexError::DiscountLength {
            len: sampling.discount_rate.len(),
            expected: n_years,
        });
    }

    let hours = sampling.hour_sample.clone();
    let hour_weight = if config.use_hourly_scale {
        n_hours as f64 / hours.len() as f64
    } else {
        1.0
    };
    let years = sampling.year_sample.clone();
    let year_weights = years
        .iter()
        .enumerate()
        .map(|(i, &y)| (years.get(i + 1).copied().unwrap_or(n_years) - y) as f64)
        .collect();
    let discount = discount_factors(&sampling.discount_rate);
    let buckets = year_buckets(&years, n_years, config.n_years_aggregation, &discount);

    debug!(
        hours = hours.len(),
        years = years.len(),
        buckets = buckets.len(),
        "indices resolved"
    );

    Ok(Indices {
        n_years,
        n_hours,
        hour_weights: vec![hour_weight; hours.len()],
        hours,
        years,
        year_weights,
        buckets,
        discount_factors: discount,
        tables: build_tables(network),
    })
}

fn build_tables(network: &ValidatedNetwork) -> NetworkTables {
    let n_buses = network.buses.len();
    let mut tables = NetworkTables {
        bus_generators: vec![Vec::new(); n_buses],
        bus_storages: vec![Vec::new(); n_buses],
        bus_lines_in: vec![Vec::new(); n_buses],
        bus_lines_out: vec![Vec::new(); n_buses],
        ..NetworkTables::default()
    };

    for (position, bus) in network.buses.iter().enumerate() {
        tables
            .buses_by_energy_type
            .entry(bus.energy_type.clone())
            .or_default()
            .push(BusId::new(position));
    }

    for (position, line) in network.lines.iter().enumerate() {
        let id = LineId::new(position);
        if let Some(from) = network.buses.position(&line.from) {
            tables.bus_lines_out[from].push(id);
        }
        if let Some(to) = network.buses.position(&line.to) {
            tables.bus_lines_in[to].push(id);
        }
    }

    for stack in &network.local_balancing_stacks {
        tables.stack_buses.push(
            stack
                .buses
                .values()
                .filter_map(|bus| network.buses.position(bus))
                .map(BusId::new)
                .collect(),
        );
    }
    tables.stack_aggregate = vec![None; network.local_balancing_stacks.len()];
    for (a, aggregate) in network.aggregated_consumers.iter().enumerate() {
        let stacks: Vec<StackId> = aggregate
            .stacks()
            .filter_map(|name| network.local_balancing_stacks.position(name))
            .map(StackId::new)
            .collect();
        for stack in &stacks {
            tables.stack_aggregate[stack.index()].get_or_insert(AggregateId::new(a));
        }
        tables.aggregate_stacks.push(stacks);
    }

    let mut bus_aggregate: Vec<Option<AggregateId>> = vec![None; n_buses];
    for (stack, buses) in tables.stack_buses.iter().enumerate() {
        if let Some(aggregate) = tables.stack_aggregate[stack] {
            for bus in buses {
                bus_aggregate[bus.index()].get_or_insert(aggregate);
            }
        }
    }

    for (position, generator) in network.generators.iter().enumerate() {
        let id = GeneratorId::new(position);
        let buses: Vec<BusId> = generator
            .buses
            .iter()
            .filter_map(|bus| network.buses.position(bus))
            .map(BusId::new)
            .collect();
        for bus in &buses {
            tables.bus_generators[bus.index()].push(id);
        }
        tables
            .generator_aggregate
            .push(buses.iter().find_map(|bus| bus_aggregate[bus.index()]));
        tables.generator_buses.push(buses);
        tables.generator_type.push(GeneratorTypeId::new(
            network
                .generator_types
                .position(&generator.generator_type)
                .unwrap_or_default(),
        ));
        for tag in network.generator_tags(generator) {
            tables
                .generator_tags
                .entry(tag.to_string())
                .or_default()
                .push(id);
        }
    }

    for (position, storage) in network.storages.iter().enumerate() {
        let id = StorageId::new(position);
        let bus = network.buses.position(&storage.bus).unwrap_or_default();
        tables.bus_storages[bus].push(id);
        tables.storage_bus.push(BusId::new(bus));
        tables.storage_aggregate.push(bus_aggregate[bus]);
        tables.storage_type.push(StorageTypeId::new(
            network
                .storage_types
                .position(&storage.storage_type)
                .unwrap_or_default(),
        ));
        for tag in network.storage_tags(storage) {
            tables
                .storage_tags
                .entry(tag.to_string())
                .or_default()
                .push(id);
        }
    }

    tables
}
