//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use mep_core::*;
use mep_opt::{
    build, build_indices, solve, LinearModel, OptimizationInputData, Sampling, SolveOutcome,
    VarKey, VarKind,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Single energy type network: electricity.
pub fn network(n_years: usize, n_hours: usize) -> Network {
    Network::new(NetworkConstants::new(n_years, n_hours)).with_energy_types(["electricity"])
}

pub fn params(n_years: usize, capex: f64, opex: f64) -> TechnologyParams {
    TechnologyParams::flat(50, n_years, capex, opex)
}

/// Add a bus unless it exists already.
pub fn bus(network: &mut Network, name: &str) {
    if !network.buses.contains(name) {
        network.add_bus(Bus::new(name, "electricity")).unwrap();
    }
}

/// Add a generator together with its own type `<name>_type`.
pub fn unit(network: &mut Network, name: &str, ty: GeneratorType, bus_name: &str, base: f64) {
    unit_with(network, name, ty, bus_name, base, |generator| generator);
}

/// Like [`unit`], with the generator record adjusted by `edit`.
pub fn unit_with(
    network: &mut Network,
    name: &str,
    ty: GeneratorType,
    bus_name: &str,
    base: f64,
    edit: impl FnOnce(Generator) -> Generator,
) {
    bus(network, bus_name);
    let ty_name = format!("{name}_type");
    let ty = GeneratorType {
        name: ty_name.clone(),
        ..ty
    };
    network.add_generator_type(ty).unwrap();
    let generator = Generator::new(name, ty_name)
        .with_bus(bus_name)
        .with_base_capacity(base);
    network.add_generator(edit(generator)).unwrap();
}

pub fn plain_type(n_years: usize, capex: f64, opex: f64) -> GeneratorType {
    GeneratorType::new("", params(n_years, capex, opex)).with_output("electricity", 1.0)
}

/// Consumers with a fixed hourly demand on one bus.
pub fn consumers(network: &mut Network, name: &str, bus_name: &str, hourly: &[f64]) {
    bus(network, bus_name);
    let n_years = network.n_years();
    let total: f64 = hourly.iter().sum();
    let profile: Vec<f64> = hourly.iter().map(|h| h / total).collect();
    let stack = format!("LBS_{name}");

    network
        .add_demand_profile(DemandProfile::new(name).with_profile("electricity", profile))
        .unwrap();
    network
        .add_local_balancing_stack(
            LocalBalancingStack::new(&stack).with_bus("electricity", bus_name),
        )
        .unwrap();
    let mut aggregate = AggregatedConsumer::new(name, name)
        .with_stack(&stack, 1.0)
        .with_usage("electricity", vec![total; n_years]);
    aggregate.n_consumers = vec![1.0; n_years];
    network.add_aggregated_consumer(aggregate).unwrap();
}

pub fn config(ens_penalty_cost: Option<f64>) -> OptimizationConfig {
    OptimizationConfig {
        ens_penalty_cost,
        solver: SolverSettings {
            name: "microlp".to_string(),
            ..SolverSettings::default()
        },
        ..OptimizationConfig::default()
    }
}

pub struct Solved {
    pub input: OptimizationInputData,
    pub model: LinearModel,
    pub outcome: SolveOutcome,
}

impl Solved {
    pub fn value(&self, key: &VarKey) -> f64 {
        let id = self
            .model
            .find(key)
            .unwrap_or_else(|| panic!("no variable {}", key.name()));
        self.outcome.values.as_ref().expect("solution values")[id.index()]
    }

    pub fn generation(&self, generator: &str, d: usize, hour: usize) -> f64 {
        self.value(&VarKey::hourly(
            ElementKind::Generator,
            generator,
            VarKind::Generation,
            d,
            hour,
        ))
    }

    pub fn hourly(&self, element: ElementKind, entity: &str, kind: VarKind, hour: usize) -> f64 {
        self.value(&VarKey::hourly(element, entity, kind, 0, hour))
    }

    pub fn capacity(&self, generator: &str, d: usize) -> f64 {
        self.value(&VarKey::yearly(
            ElementKind::Generator,
            generator,
            VarKind::Capacity,
            d,
        ))
    }
}

pub fn input(
    network: Network,
    sampling: &Sampling,
    config: &OptimizationConfig,
) -> OptimizationInputData {
    let network = network.into_validated_with(&config.validator()).unwrap();
    let indices = build_indices(&network, sampling, config).unwrap();
    OptimizationInputData::new(&network, indices, config.clone()).unwrap()
}

pub fn solve_with(network: Network, sampling: &Sampling, config: &OptimizationConfig) -> Solved {
    init_tracing();
    let input = input(network, sampling, config);
    let model = build(&input).unwrap();
    let outcome = solve(&model, &config.solver).unwrap();
    Solved {
        input,
        model,
        outcome,
    }
}

/// Every hour and year sampled, no discounting.
pub fn solve_full(network: Network, config: &OptimizationConfig) -> Solved {
    let sampling = Sampling::full(network.n_years(), network.n_hours(), 0.0);
    solve_with(network, &sampling, config)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
