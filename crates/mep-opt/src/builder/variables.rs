//! Decision variables, created once per model and addressed by position.

use crate::input::{CapacityInput, ChunkInput, OptimizationInputData};
use crate::model::{LinearModel, VarId, VarKey, VarKind};
use mep_core::ElementKind;

/// Hourly variables indexed `[decision year][sampled hour]`.
pub type HourGrid = Vec<Vec<VarId>>;

#[derive(Debug, Clone)]
pub struct CapacityVars {
    /// Installed capacity per decision year
    pub cap: Vec<VarId>,
    /// Capacity built per decision year
    pub cap_plus: Vec<VarId>,
}

#[derive(Debug, Clone)]
pub struct GeneratorVars {
    pub capacity: CapacityVars,
    pub gen: HourGrid,
    /// One grid per output, `None` when dumping is disabled
    pub dump: Vec<Option<HourGrid>>,
    /// `(reserve position, grid)` for every declared reserve the unit serves
    pub reserve: Vec<(usize, HourGrid)>,
    pub chunks: Vec<ChunkShare>,
}

#[derive(Debug, Clone)]
pub struct StorageVars {
    pub capacity: CapacityVars,
    pub gen: HourGrid,
    pub load: HourGrid,
    pub soc: HourGrid,
    pub reserve: Vec<(usize, HourGrid)>,
    pub chunks: Vec<ChunkShare>,
}

/// Output a unit delivers to one demand chunk instead of its bus.
///
/// Measured in the chunk's energy type and fixed to zero outside the
/// chunk's periods.
#[derive(Debug, Clone)]
pub struct ChunkShare {
    /// Position in the chunk inputs
    pub chunk: usize,
    /// Generator output the share is taken from; `0` for storages
    pub output: usize,
    pub grid: HourGrid,
}

#[derive(Debug, Clone)]
pub struct VariableRegistry {
    pub generators: Vec<GeneratorVars>,
    pub storages: Vec<StorageVars>,
    pub flows: Vec<HourGrid>,
    /// Per bus, when energy not served is enabled
    pub ens: Vec<Option<HourGrid>>,
    /// Per bus with demand and a DSR program
    pub shift_minus: Vec<Option<HourGrid>>,
    pub shift_plus: Vec<Option<HourGrid>>,
    /// `[aggregate][stack slot][decision year]`
    pub fractions: Vec<Vec<Vec<VarId>>>,
}

impl VariableRegistry {
    pub(super) fn create(input: &OptimizationInputData, model: &mut LinearModel) -> Self {
        let factory = Factory { input };
        let n_buckets = input.n_buckets();

        let generators = input
            .generators
            .iter()
            .map(|g| {
                let element = ElementKind::Generator;
                GeneratorVars {
                    capacity: factory.capacity(model, element, &g.name, &g.capacity),
                    gen: factory.grid(model, element, &g.name, VarKind::Generation, None, |_, _| {
                        (0.0, f64::INFINITY)
                    }),
                    dump: g
                        .outputs
                        .iter()
                        .map(|output| {
                            g.dump_energy.then(|| {
                                factory.grid(
                                    model,
                                    element,
                                    &g.name,
                                    VarKind::DumpEnergy,
                                    Some(&output.energy_type),
                                    |_, _| (0.0, f64::INFINITY),
                                )
                            })
                        })
                        .collect(),
                    reserve: factory.reserves(
                        model,
                        element,
                        &g.name,
                        &g.reserves,
                        g.is_dispatchable(),
                    ),
                    chunks: factory.chunk_shares(model, element, &g.name, |chunk| {
                        if !chunk.units.generators.iter().any(|(id, _)| *id == g.id) {
                            return None;
                        }
                        g.outputs
                            .iter()
                            .position(|output| output.energy_type == chunk.energy_type)
                    }),
                }
            })
            .collect();

        let storages = input
            .storages
            .iter()
            .map(|s| {
                let element = ElementKind::Storage;
                let cycle = s.cycle_length;
                let hours = &input.indices.hours;
                StorageVars {
                    capacity: factory.capacity(model, element, &s.name, &s.capacity),
                    gen: factory.grid(
                        model,
                        element,
                        &s.name,
                        VarKind::StorageGeneration,
                        None,
                        |_, _| (0.0, f64::INFINITY),
                    ),
                    load: factory.grid(model, element, &s.name, VarKind::StorageLoad, None, |_, _| {
                        (0.0, f64::INFINITY)
                    }),
                    soc: factory.grid(
                        model,
                        element,
                        &s.name,
                        VarKind::StateOfCharge,
                        None,
                        |_, i| {
                            let reset = i == 0 || cycle.is_some_and(|len| hours[i] % len == 0);
                            (0.0, if reset { 0.0 } else { f64::INFINITY })
                        },
                    ),
                    reserve: factory.reserves(model, element, &s.name, &s.reserves, true),
                    chunks: factory.chunk_shares(model, element, &s.name, |chunk| {
                        chunk.units.storages.contains(&s.id).then_some(0)
                    }),
                }
            })
            .collect();

        let flows = input
            .lines
            .iter()
            .map(|line| {
                factory.grid(model, ElementKind::Line, &line.name, VarKind::Flow, None, |_, _| {
                    (0.0, line.max_capacity)
                })
            })
            .collect();

        let ens = input
            .buses
            .iter()
            .map(|bus| {
                input.ens_enabled().then(|| {
                    factory.grid(
                        model,
                        ElementKind::Bus,
                        &bus.name,
                        VarKind::EnergyNotServed,
                        None,
                        |_, _| (0.0, f64::INFINITY),
                    )
                })
            })
            .collect();

        let dsr_buses: Vec<Option<&crate::input::DsrInput>> = input
            .buses
            .iter()
            .map(|bus| {
                bus.dsr
                    .filter(|_| bus.has_demand())
                    .map(|position| &input.dsr[position])
            })
            .collect();
        let shift_minus = input
            .buses
            .iter()
            .zip(&dsr_buses)
            .map(|(bus, dsr)| {
                dsr.map(|dsr| {
                    let limit = dsr.abs_shift_limit.unwrap_or(f64::INFINITY);
                    factory.grid(
                        model,
                        ElementKind::Bus,
                        &bus.name,
                        VarKind::ShiftMinus,
                        None,
                        |_, _| (0.0, limit),
                    )
                })
            })
            .collect();
        let shift_plus = input
            .buses
            .iter()
            .zip(&dsr_buses)
            .map(|(bus, dsr)| {
                dsr.map(|_| {
                    factory.grid(
                        model,
                        ElementKind::Bus,
                        &bus.name,
                        VarKind::ShiftPlus,
                        None,
                        |_, _| (0.0, f64::INFINITY),
                    )
                })
            })
            .collect();

        let binary = input.config.binary_fraction;
        let fractions = input
            .aggregates
            .iter()
            .map(|aggregate| {
                aggregate
                    .stack_names
                    .iter()
                    .zip(&aggregate.base_fraction)
                    .map(|(stack, &base)| {
                        (0..n_buckets)
                            .map(|d| {
                                let key = VarKey::yearly(
                                    ElementKind::AggregatedConsumer,
                                    &aggregate.name,
                                    VarKind::Fraction,
                                    d,
                                )
                                .with_qualifier(stack);
                                let (lower, upper) = if d == 0 { (base, base) } else { (0.0, 1.0) };
                                model.add_variable(key, lower, upper, binary)
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();

        Self {
            generators,
            storages,
            flows,
            ens,
            shift_minus,
            shift_plus,
            fractions,
        }
    }

    /// Installed capacity variable of a unit in decision year `d`.
    pub fn capacity(&self, unit: crate::input::UnitRef, d: usize) -> VarId {
        match unit {
            crate::input::UnitRef::Generator(id) => self.generators[id.index()].capacity.cap[d],
            crate::input::UnitRef::Storage(id) => self.storages[id.index()].capacity.cap[d],
        }
    }
}

struct Factory<'a> {
    input: &'a OptimizationInputData,
}

impl Factory<'_> {
    fn grid(
        &self,
        model: &mut LinearModel,
        element: ElementKind,
        entity: &str,
        kind: VarKind,
        qualifier: Option<&str>,
        bounds: impl Fn(usize, usize) -> (f64, f64),
    ) -> HourGrid {
        let hours = &self.input.indices.hours;
        (0..self.input.n_buckets())
            .map(|d| {
                hours
                    .iter()
                    .enumerate()
                    .map(|(i, &h)| {
                        let mut key = VarKey::hourly(element, entity, kind, d, h);
                        if let Some(qualifier) = qualifier {
                            key = key.with_qualifier(qualifier);
                        }
                        let (lower, upper) = bounds(d, i);
                        model.add_variable(key, lower, upper, false)
                    })
                    .collect()
            })
            .collect()
    }

    fn capacity(
        &self,
        model: &mut LinearModel,
        element: ElementKind,
        entity: &str,
        input: &CapacityInput,
    ) -> CapacityVars {
        let n_buckets = self.input.n_buckets();
        let bounds = |min: &[Option<f64>], max: &[Option<f64>], d: usize| {
            (
                min[d].unwrap_or(0.0).max(0.0),
                max[d].unwrap_or(f64::INFINITY),
            )
        };
        CapacityVars {
            cap: (0..n_buckets)
                .map(|d| {
                    let (lower, upper) = bounds(&input.min_capacity, &input.max_capacity, d);
                    let key = VarKey::yearly(element, entity, VarKind::Capacity, d);
                    model.add_variable(key, lower, upper, false)
                })
                .collect(),
            cap_plus: (0..n_buckets)
                .map(|d| {
                    let (lower, upper) = bounds(
                        &input.min_capacity_increase,
                        &input.max_capacity_increase,
                        d,
                    );
                    let key = VarKey::yearly(element, entity, VarKind::CapacityIncrease, d);
                    model.add_variable(key, lower, upper, false)
                })
                .collect(),
        }
    }

    /// One grid per demand chunk the unit is tagged for; `output` picks the
    /// generator output feeding the chunk, `None` when the unit is not tagged.
    fn chunk_shares(
        &self,
        model: &mut LinearModel,
        element: ElementKind,
        entity: &str,
        output: impl Fn(&ChunkInput) -> Option<usize>,
    ) -> Vec<ChunkShare> {
        let n_hours = self.input.indices.hours.len();
        let mut shares = Vec::new();
        for (c, chunk) in self.input.chunks.iter().enumerate() {
            let Some(output) = output(chunk) else { continue };
            let active: Vec<bool> = (0..n_hours)
                .map(|i| chunk.periods.iter().any(|period| period.hours.contains(&i)))
                .collect();
            let grid = self.grid(
                model,
                element,
                entity,
                VarKind::ChunkGeneration,
                Some(&chunk.name),
                |_, i| (0.0, if active[i] { f64::INFINITY } else { 0.0 }),
            );
            shares.push(ChunkShare {
                chunk: c,
                output,
                grid,
            });
        }
        shares
    }

    fn reserves(
        &self,
        model: &mut LinearModel,
        element: ElementKind,
        entity: &str,
        keys: &[String],
        contributes: bool,
    ) -> Vec<(usize, HourGrid)> {
        if !contributes {
            return Vec::new();
        }
        self.input
            .reserves
            .iter()
            .enumerate()
            .filter(|(_, reserve)| keys.contains(&reserve.key))
            .map(|(r, reserve)| {
                let key = Some(reserve.key.as_str());
                let grid = self.grid(model, element, entity, VarKind::Reserve, key, |_, _| {
                    (0.0, f64::INFINITY)
                });
                (r, grid)
            })
            .collect()
    }
}
