//! The owning aggregate of every network element.

use crate::arena::ElementArena;
use crate::diagnostics::Diagnostics;
use crate::entities::*;
use crate::error::{MepError, MepResult};
use crate::ids::*;
use crate::validation::{NetworkValidator, ValidationMode, ValidationReport};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Requirement that part of the installed capacity stays uncommitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerReserve {
    pub energy_type: String,
    /// Fraction of the contributors' installed capacity held in reserve
    pub fraction: f64,
}

/// Global constants of the planning horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConstants {
    pub n_years: usize,
    pub n_hours: usize,
    /// emission type -> yearly limit as a fraction of `base_total_emission`
    #[serde(default)]
    pub relative_emission_limits: IndexMap<String, YearSeries>,
    /// emission type -> absolute yearly limit
    #[serde(default)]
    pub absolute_emission_limits: IndexMap<String, YearSeries>,
    #[serde(default)]
    pub base_total_emission: IndexMap<String, f64>,
    /// reserve key -> requirement
    #[serde(default)]
    pub power_reserves: IndexMap<String, PowerReserve>,
}

impl NetworkConstants {
    pub fn new(n_years: usize, n_hours: usize) -> Self {
        Self {
            n_years,
            n_hours,
            ..Self::default()
        }
    }
}

/// Multi-energy network: keyed element collections plus global constants.
///
/// Elements are added once through the `add_*` operations, which only
/// enforce name uniqueness. Everything else is checked in one batch by
/// [`Network::into_validated`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub constants: NetworkConstants,
    pub energy_types: Vec<String>,
    pub emission_types: Vec<String>,
    pub buses: ElementArena<Bus>,
    pub lines: ElementArena<Line>,
    pub generator_types: ElementArena<GeneratorType>,
    pub storage_types: ElementArena<StorageType>,
    pub generators: ElementArena<Generator>,
    pub storages: ElementArena<Storage>,
    pub fuels: ElementArena<Fuel>,
    pub capacity_factors: ElementArena<CapacityFactor>,
    pub emission_fees: ElementArena<EmissionFee>,
    pub transmission_fees: ElementArena<TransmissionFee>,
    pub demand_profiles: ElementArena<DemandProfile>,
    pub local_balancing_stacks: ElementArena<LocalBalancingStack>,
    pub aggregated_consumers: ElementArena<AggregatedConsumer>,
    pub demand_chunks: ElementArena<DemandChunk>,
    pub capacity_bounds: ElementArena<CapacityBound>,
    pub generation_fractions: ElementArena<GenerationFraction>,
    pub dsr: ElementArena<Dsr>,
}

impl Network {
    pub fn new(constants: NetworkConstants) -> Self {
        Self {
            constants,
            ..Self::default()
        }
    }

    pub fn with_energy_types<I, S>(mut self, energy_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.energy_types = energy_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_emission_types<I, S>(mut self, emission_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emission_types = emission_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn n_years(&self) -> usize {
        self.constants.n_years
    }

    pub fn n_hours(&self) -> usize {
        self.constants.n_hours
    }

    pub fn add_bus(&mut self, bus: Bus) -> MepResult<BusId> {
        self.buses.insert(bus).map(BusId::new)
    }

    pub fn add_line(&mut self, line: Line) -> MepResult<LineId> {
        self.lines.insert(line).map(LineId::new)
    }

    pub fn add_generator_type(&mut self, ty: GeneratorType) -> MepResult<GeneratorTypeId> {
        self.generator_types.insert(ty).map(GeneratorTypeId::new)
    }

    pub fn add_storage_type(&mut self, ty: StorageType) -> MepResult<StorageTypeId> {
        self.storage_types.insert(ty).map(StorageTypeId::new)
    }

    pub fn add_generator(&mut self, generator: Generator) -> MepResult<GeneratorId> {
        self.generators.insert(generator).map(GeneratorId::new)
    }

    pub fn add_storage(&mut self, storage: Storage) -> MepResult<StorageId> {
        self.storages.insert(storage).map(StorageId::new)
    }

    pub fn add_fuel(&mut self, fuel: Fuel) -> MepResult<()> {
        self.fuels.insert(fuel).map(drop)
    }

    pub fn add_capacity_factor(&mut self, factor: CapacityFactor) -> MepResult<()> {
        self.capacity_factors.insert(factor).map(drop)
    }

    pub fn add_emission_fee(&mut self, fee: EmissionFee) -> MepResult<()> {
        self.emission_fees.insert(fee).map(drop)
    }

    pub fn add_transmission_fee(&mut self, fee: TransmissionFee) -> MepResult<()> {
        self.transmission_fees.insert(fee).map(drop)
    }

    pub fn add_demand_profile(&mut self, profile: DemandProfile) -> MepResult<()> {
        self.demand_profiles.insert(profile).map(drop)
    }

    pub fn add_local_balancing_stack(&mut self, stack: LocalBalancingStack) -> MepResult<StackId> {
        self.local_balancing_stacks.insert(stack).map(StackId::new)
    }

    pub fn add_aggregated_consumer(
        &mut self,
        aggregate: AggregatedConsumer,
    ) -> MepResult<AggregateId> {
        self.aggregated_consumers
            .insert(aggregate)
            .map(AggregateId::new)
    }

    pub fn add_demand_chunk(&mut self, chunk: DemandChunk) -> MepResult<()> {
        self.demand_chunks.insert(chunk).map(drop)
    }

    pub fn add_capacity_bound(&mut self, bound: CapacityBound) -> MepResult<()> {
        self.capacity_bounds.insert(bound).map(drop)
    }

    pub fn add_generation_fraction(&mut self, fraction: GenerationFraction) -> MepResult<()> {
        self.generation_fractions.insert(fraction).map(drop)
    }

    pub fn add_dsr(&mut self, dsr: Dsr) -> MepResult<()> {
        self.dsr.insert(dsr).map(drop)
    }

    pub fn add_power_reserve(
        &mut self,
        key: impl Into<String>,
        reserve: PowerReserve,
    ) -> MepResult<()> {
        let key = key.into();
        if self.constants.power_reserves.contains_key(&key) {
            return Err(MepError::Config(format!(
                "power reserve '{key}' has already been declared"
            )));
        }
        self.constants.power_reserves.insert(key, reserve);
        Ok(())
    }

    /// Type tags followed by instance tags, without repeats.
    pub fn generator_tags<'a>(&'a self, generator: &'a Generator) -> Vec<&'a str> {
        let type_tags = self
            .generator_types
            .get(&generator.generator_type)
            .map(|ty| ty.params.tags.as_slice())
            .unwrap_or_default();
        merge_tags(type_tags, &generator.tags)
    }

    pub fn storage_tags<'a>(&'a self, storage: &'a Storage) -> Vec<&'a str> {
        let type_tags = self
            .storage_types
            .get(&storage.storage_type)
            .map(|ty| ty.params.tags.as_slice())
            .unwrap_or_default();
        merge_tags(type_tags, &storage.tags)
    }

    /// Whether any generator or storage carries `tag`.
    pub fn tag_in_use(&self, tag: &str) -> bool {
        self.generators
            .iter()
            .any(|g| self.generator_tags(g).contains(&tag))
            || self.storages.iter().any(|s| self.storage_tags(s).contains(&tag))
    }

    /// Capacity unit of a referenced technology, `None` when it does not resolve.
    pub fn capacity_unit(&self, reference: &TechnologyRef) -> Option<CapacityUnit> {
        let resolves = match reference {
            TechnologyRef::Generator(name) => self.generators.contains(name),
            TechnologyRef::GeneratorType(name) => self.generator_types.contains(name),
            TechnologyRef::Storage(name) => self.storages.contains(name),
            TechnologyRef::StorageType(name) => self.storage_types.contains(name),
        };
        match reference {
            TechnologyRef::Generator(_) | TechnologyRef::GeneratorType(_) if resolves => {
                Some(CapacityUnit::Power)
            }
            TechnologyRef::Storage(_) | TechnologyRef::StorageType(_) if resolves => {
                Some(CapacityUnit::Energy)
            }
            _ => None,
        }
    }

    /// Aggregated consumers whose stacks include `stack`.
    pub fn aggregates_of_stack<'a>(
        &'a self,
        stack: &'a str,
    ) -> impl Iterator<Item = &'a AggregatedConsumer> + 'a {
        self.aggregated_consumers
            .iter()
            .filter(move |a| a.stack_base_fraction.contains_key(stack))
    }

    /// Run the validator without consuming the network.
    pub fn validate(&self, mode: ValidationMode) -> Diagnostics {
        NetworkValidator::new(mode).run(self)
    }

    /// Validate the network and freeze it.
    ///
    /// On failure the network is dropped and the error carries every
    /// collected issue. Warnings are logged and kept on the result.
    pub fn into_validated(self, mode: ValidationMode) -> MepResult<ValidatedNetwork> {
        self.into_validated_with(&NetworkValidator::new(mode))
    }

    pub fn into_validated_with(self, validator: &NetworkValidator) -> MepResult<ValidatedNetwork> {
        let mut diagnostics = validator.run(&self);
        let warnings = diagnostics.take_warnings();
        for issue in warnings.warnings() {
            warn!(target: "mep::validation", "{issue}");
        }
        if diagnostics.has_errors() {
            return Err(MepError::Validation(ValidationReport::new(diagnostics)));
        }
        info!(
            buses = self.buses.len(),
            generators = self.generators.len(),
            storages = self.storages.len(),
            lines = self.lines.len(),
            "network validated ({})",
            warnings.summary()
        );
        Ok(ValidatedNetwork {
            network: self,
            warnings,
        })
    }
}

fn merge_tags<'a>(type_tags: &'a [String], own_tags: &'a [String]) -> Vec<&'a str> {
    let mut tags: Vec<&str> = Vec::with_capacity(type_tags.len() + own_tags.len());
    for tag in type_tags.iter().chain(own_tags) {
        if !tags.contains(&tag.as_str()) {
            tags.push(tag);
        }
    }
    tags
}

/// A network that passed validation. Read-only from here on.
#[derive(Debug, Clone)]
pub struct ValidatedNetwork {
    network: Network,
    warnings: Diagnostics,
}

impl ValidatedNetwork {
    pub fn warnings(&self) -> &Diagnostics {
        &self.warnings
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}

impl std::ops::Deref for ValidatedNetwork {
    type Target = Network;

    fn deref(&self) -> &Network {
        &self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_rejected_per_collection() {
        let mut network = Network::new(NetworkConstants::new(1, 2));
        network.add_bus(Bus::new("X", "heat")).unwrap();

        let err = network.add_bus(Bus::new("X", "heat")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Network element bus with name 'X' has already been added"
        );

        // Same name in another collection is fine.
        network
            .add_line(Line::new("X", "heat", "X", "X", 1.0))
            .unwrap();
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut network = Network::new(NetworkConstants::new(1, 1));
        let a = network.add_bus(Bus::new("A", "heat")).unwrap();
        let b = network.add_bus(Bus::new("B", "heat")).unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
    }

    #[test]
    fn tags_merge_type_and_instance() {
        let mut network = Network::new(NetworkConstants::new(1, 1));
        let mut params = TechnologyParams::flat(10, 1, 1.0, 0.0);
        params.tags = vec!["res".into(), "wind".into()];
        network
            .add_generator_type(GeneratorType::new("wind", params).with_output("electricity", 1.0))
            .unwrap();
        let gen = Generator::new("W1", "wind").with_tag("wind").with_tag("onshore");
        network.add_generator(gen.clone()).unwrap();

        assert_eq!(network.generator_tags(&gen), vec!["res", "wind", "onshore"]);
        assert!(network.tag_in_use("onshore"));
        assert!(!network.tag_in_use("nuclear"));
    }

    #[test]
    fn capacity_units_by_reference_kind() {
        let mut network = Network::new(NetworkConstants::new(1, 1));
        network
            .add_storage_type(StorageType::new(
                "battery",
                "electricity",
                TechnologyParams::flat(10, 1, 1.0, 0.0),
            ))
            .unwrap();

        assert_eq!(
            network.capacity_unit(&TechnologyRef::StorageType("battery".into())),
            Some(CapacityUnit::Energy)
        );
        assert_eq!(
            network.capacity_unit(&TechnologyRef::Generator("ghost".into())),
            None
        );
    }

    #[test]
    fn network_round_trips_through_json() {
        let mut network = Network::new(NetworkConstants::new(2, 24))
            .with_energy_types(["electricity"]);
        network.add_bus(Bus::new("EE", "electricity")).unwrap();

        let json = serde_json::to_string(&network).unwrap();
        let restored: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.buses.len(), 1);
        assert_eq!(restored.n_hours(), 24);
        assert_eq!(restored.energy_types, vec!["electricity".to_string()]);
    }
}
