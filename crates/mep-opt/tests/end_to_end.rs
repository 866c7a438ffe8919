mod common;

use common::*;
use mep_core::*;
use mep_opt::{
    build, plan, ConstraintFamily, ModelBuilder, OptError, ProblemClass, Sampling, SolveStatus,
    VarKey, VarKind,
};

/// Generator `PP_1` on `EE_1` feeding demand [5, 5] on `EE_2` over a line.
fn two_bus(capacity: f64) -> Network {
    let mut network = network(1, 2);
    let mut ty = plain_type(1, 100.0, 1.0);
    ty.params.max_capacity = vec![Some(capacity)];
    ty.disable_dump_energy = true;
    unit(&mut network, "PP_1", ty, "EE_1", capacity);
    consumers(&mut network, "households", "EE_2", &[5.0, 5.0]);
    network
        .add_line(Line::new("L_1", "electricity", "EE_1", "EE_2", 100.0))
        .unwrap();
    network
}

fn ens(solved: &Solved, bus: &str, hour: usize) -> f64 {
    solved.value(&VarKey::hourly(
        ElementKind::Bus,
        bus,
        VarKind::EnergyNotServed,
        0,
        hour,
    ))
}

#[test]
fn demand_is_served_over_the_line() {
    let solved = solve_full(two_bus(10.0), &config(Some(1000.0)));

    assert_eq!(solved.outcome.status, SolveStatus::Optimal);
    // Only opex on the base capacity is paid
    assert_close(solved.outcome.objective.unwrap(), 10.0);
    for hour in 0..2 {
        assert_close(ens(&solved, "EE_2", hour), 0.0);
        assert_close(solved.generation("PP_1", 0, hour), 5.0);
    }
}

#[test]
fn missing_capacity_without_ens_is_infeasible() {
    let solved = solve_full(two_bus(3.0), &config(None));

    assert_eq!(solved.outcome.status, SolveStatus::Infeasible);
    assert!(solved.outcome.values.is_none());
    let err = solved.outcome.into_result().unwrap_err();
    assert!(matches!(
        err,
        OptError::SolverStatus {
            status: SolveStatus::Infeasible,
            ..
        }
    ));
}

#[test]
fn missing_capacity_is_covered_by_ens() {
    let solved = solve_full(two_bus(3.0), &config(Some(1000.0)));

    assert_eq!(solved.outcome.status, SolveStatus::Optimal);
    for hour in 0..2 {
        assert_close(ens(&solved, "EE_2", hour), 2.0);
    }
}

#[test]
fn every_row_holds_at_the_optimum() {
    let mut network = network(1, 2);
    let mut ty = plain_type(1, 100.0, 0.0);
    ty.params.max_capacity = vec![Some(5.0)];
    unit(&mut network, "PP_1", ty, "EE_1", 5.0);
    consumers(&mut network, "households", "EE_2", &[2.0, 8.0]);
    network
        .add_line(Line::new("L_1", "electricity", "EE_1", "EE_2", 100.0).with_loss(0.1))
        .unwrap();
    network
        .add_storage_type(StorageType::new(
            "battery",
            "electricity",
            params(1, 1.0, 0.0),
        ))
        .unwrap();
    network
        .add_storage(Storage::new("ST_1", "battery", "EE_2"))
        .unwrap();

    let solved = solve_full(network, &config(Some(1000.0)));
    assert_eq!(solved.outcome.status, SolveStatus::Optimal);

    let values = solved.outcome.values.as_ref().unwrap();
    assert_eq!(solved.model.rows_of(ConstraintFamily::Balance).count(), 4);
    for row in solved.model.rows() {
        assert!(
            row.violation(values) < 1e-6,
            "row {} violated by {}",
            row.name,
            row.violation(values)
        );
    }
    assert_close(
        solved.model.objective_value(values),
        solved.outcome.objective.unwrap(),
    );
}

#[test]
fn generation_fraction_caps_tagged_output() {
    let mut network = network(1, 1);
    let mut cheap = plain_type(1, 100.0, 0.0);
    cheap.params.tags = vec!["a".into()];
    let mut must_run = plain_type(1, 100.0, 0.0);
    must_run.params.tags = vec!["b".into()];
    must_run.params.max_capacity = vec![Some(10.0)];
    must_run.minimal_power_utilization = vec![Some(1.0)];
    must_run.disable_dump_energy = true;
    unit(&mut network, "A", cheap, "EE", 100.0);
    unit(&mut network, "B", must_run, "EE", 10.0);
    consumers(&mut network, "households", "EE", &[20.0]);
    network
        .add_generation_fraction(GenerationFraction {
            name: "a_share".into(),
            tag: "b".into(),
            sub_tag: "a".into(),
            energy_type: "electricity".into(),
            fraction_type: FractionType::Yearly,
            min_generation_fraction: Vec::new(),
            max_generation_fraction: vec![Some(0.5)],
        })
        .unwrap();

    let solved = solve_full(network, &config(Some(1000.0)));
    assert_eq!(solved.outcome.status, SolveStatus::Optimal);
    assert_close(solved.generation("B", 0, 0), 10.0);
    assert!(solved.generation("A", 0, 0) <= 5.0 + 1e-6);
    assert_close(ens(&solved, "EE", 0), 5.0);
}

/// Cheap `A` and dear `B` meeting a demand of 10, tied by a capacity bound.
fn bounded(sense: BoundSense, coefficient: f64) -> Solved {
    let mut network = network(1, 1);
    unit(&mut network, "A", plain_type(1, 1.0, 0.0), "EE", 0.0);
    unit(&mut network, "B", plain_type(1, 10.0, 0.0), "EE", 0.0);
    consumers(&mut network, "households", "EE", &[10.0]);
    let mut bound = CapacityBound::new(
        "a_vs_b",
        TechnologyRef::Generator("A".into()),
        sense,
        TechnologyRef::Generator("B".into()),
    );
    bound.left_coefficient = coefficient;
    network.add_capacity_bound(bound).unwrap();
    solve_full(network, &config(None))
}

#[test]
fn capacity_bound_leq() {
    let solved = bounded(BoundSense::Leq, 1.0);
    assert_eq!(solved.outcome.status, SolveStatus::Optimal);
    assert_close(solved.capacity("A", 0), 5.0);
    assert_close(solved.capacity("B", 0), 5.0);
}

#[test]
fn capacity_bound_eq_with_coefficient() {
    let solved = bounded(BoundSense::Eq, 2.0);
    assert_eq!(solved.outcome.status, SolveStatus::Optimal);
    assert_close(solved.capacity("A", 0), 10.0 / 3.0);
    assert_close(solved.capacity("B", 0), 20.0 / 3.0);
    assert_eq!(solved.model.rows_of(ConstraintFamily::CapacityBound).count(), 1);
}

#[test]
fn absolute_emission_limit_restricts_fuel_burn() {
    let mut network = network(1, 1).with_emission_types(["CO2"]);
    network
        .constants
        .absolute_emission_limits
        .insert("CO2".into(), vec![Some(5.0)]);
    network
        .add_fuel(Fuel {
            name: "coal".into(),
            emission: [("CO2".to_string(), 1.0)].into_iter().collect(),
            availability: Vec::new(),
            cost: vec![0.0],
            energy_per_unit: 1.0,
        })
        .unwrap();
    let coal = GeneratorType {
        fuel: Some("coal".into()),
        ..plain_type(1, 1.0, 0.0)
    };
    unit(&mut network, "COAL", coal, "EE", 0.0);
    unit(&mut network, "CLEAN", plain_type(1, 2.0, 0.0), "EE", 0.0);
    consumers(&mut network, "households", "EE", &[10.0]);

    let solved = solve_full(network, &config(None));
    assert_eq!(solved.outcome.status, SolveStatus::Optimal);
    assert_close(solved.generation("COAL", 0, 0), 5.0);
    assert_close(solved.generation("CLEAN", 0, 0), 5.0);
}

#[test]
fn dsr_moves_demand_within_the_period() {
    let mut network = network(1, 2);
    network
        .add_bus(Bus::new("EE", "electricity").with_dsr("flex"))
        .unwrap();
    network
        .add_dsr(Dsr {
            name: "flex".into(),
            compensation_factor: 1.0,
            balancing_period_len: 2,
            penalization: 0.1,
            relative_shift_limit: Some(0.5),
            abs_shift_limit: None,
        })
        .unwrap();
    let mut ty = plain_type(1, 100.0, 0.0);
    ty.params.max_capacity = vec![Some(5.0)];
    unit(&mut network, "PP_1", ty, "EE", 5.0);
    consumers(&mut network, "households", "EE", &[2.0, 8.0]);

    let solved = solve_full(network, &config(None));
    assert_eq!(solved.outcome.status, SolveStatus::Optimal);
    let shed = solved.value(&VarKey::hourly(
        ElementKind::Bus,
        "EE",
        VarKind::ShiftMinus,
        0,
        1,
    ));
    let recovered = solved.value(&VarKey::hourly(
        ElementKind::Bus,
        "EE",
        VarKind::ShiftPlus,
        0,
        0,
    ));
    assert_close(shed, 3.0);
    assert_close(recovered, 3.0);
}

#[test]
fn aggregated_years_take_the_last_bound() {
    let mut network = network(10, 1);
    let mut ty = plain_type(10, 1.0, 0.0);
    ty.params.life_time = 20;
    let levels: Vec<Option<f64>> = (0..10).map(|y| Some(10.0 * (y + 1) as f64)).collect();
    ty.params.min_capacity = levels.clone();
    ty.params.max_capacity = levels;
    unit(&mut network, "PP", ty, "EE", 0.0);

    let config = OptimizationConfig {
        n_years_aggregation: 5,
        ..config(None)
    };
    let sampling = Sampling::full(10, 1, 0.0);
    let results = plan(network, &sampling, &config).unwrap();

    assert_eq!(results.status, SolveStatus::Optimal);
    for year in 0..5 {
        let cap = results.get("PP", VarKind::Capacity, None, year, None).unwrap();
        assert_close(cap, 50.0);
    }
    for year in 5..10 {
        let cap = results.get("PP", VarKind::Capacity, None, year, None).unwrap();
        assert_close(cap, 100.0);
    }
    assert_eq!(results.series("PP", VarKind::Capacity).count(), 10);
}

#[test]
fn retired_base_capacity_is_replaced() {
    let mut network = network(6, 1);
    let mut ty = plain_type(6, 10.0, 1.0);
    ty.params.life_time = 3;
    unit(&mut network, "PP", ty, "EE", 10.0);
    consumers(&mut network, "households", "EE", &[5.0]);

    let config = OptimizationConfig {
        n_years_aggregation: 3,
        ..config(None)
    };
    let sampling = Sampling::full(6, 1, 0.0);
    let solved = solve_with(network, &sampling, &config);

    let capacity = &solved.input.generators[0].capacity;
    assert_eq!(capacity.base_alive, vec![true, false]);
    assert_eq!(capacity.vintages, vec![vec![0], vec![1]]);

    assert_eq!(solved.outcome.status, SolveStatus::Optimal);
    assert_close(solved.capacity("PP", 0), 10.0);
    assert_close(solved.capacity("PP", 1), 5.0);
}

#[test]
fn binary_fractions_move_consumers_to_cheap_fuel() {
    let mut network = network(2, 1);
    for (fuel, cost) in [("oil", 100.0), ("gas", 1.0)] {
        network
            .add_fuel(Fuel {
                name: fuel.into(),
                cost: vec![cost; 2],
                energy_per_unit: 1.0,
                ..Fuel::default()
            })
            .unwrap();
    }
    for (name, fuel, bus_name) in [("GA", "oil", "EE_A"), ("GB", "gas", "EE_B")] {
        let ty = GeneratorType {
            fuel: Some(fuel.into()),
            ..plain_type(2, 100.0, 0.0)
        };
        unit(&mut network, name, ty, bus_name, 10.0);
    }
    network
        .add_demand_profile(DemandProfile::new("flat").with_profile("electricity", vec![1.0]))
        .unwrap();
    for (stack, bus_name) in [("LBS_A", "EE_A"), ("LBS_B", "EE_B")] {
        network
            .add_local_balancing_stack(
                LocalBalancingStack::new(stack).with_bus("electricity", bus_name),
            )
            .unwrap();
    }
    let mut households = AggregatedConsumer::new("households", "flat")
        .with_stack("LBS_A", 1.0)
        .with_stack("LBS_B", 0.0)
        .with_usage("electricity", vec![5.0; 2]);
    households.n_consumers = vec![1.0; 2];
    network.add_aggregated_consumer(households).unwrap();

    let config = OptimizationConfig {
        binary_fraction: true,
        ..config(None)
    };
    let solved = solve_full(network, &config);

    assert_eq!(solved.model.problem_class(), ProblemClass::MixedInteger);
    assert_eq!(solved.outcome.status, SolveStatus::Optimal);
    let fraction = |stack: &str, d: usize| {
        solved.value(
            &VarKey::yearly(
                ElementKind::AggregatedConsumer,
                "households",
                VarKind::Fraction,
                d,
            )
            .with_qualifier(stack),
        )
    };
    assert_close(fraction("LBS_A", 0), 1.0);
    assert_close(fraction("LBS_B", 1), 1.0);
    assert_close(solved.generation("GB", 1, 0), 5.0);
}

#[test]
fn model_text_is_deterministic() {
    init_tracing();
    let config = config(Some(1000.0));
    let sampling = Sampling::full(1, 2, 0.0);
    let first = build(&input(two_bus(10.0), &sampling, &config)).unwrap();
    let second = build(&input(two_bus(10.0), &sampling, &config)).unwrap();
    assert_eq!(first.to_lp_string(), second.to_lp_string());
    assert!(first.to_lp_string().contains("balance(EE_2,0,1)"));
}

#[test]
fn families_build_in_isolation() {
    init_tracing();
    let config = config(Some(1000.0));
    let sampling = Sampling::full(1, 2, 0.0);
    let input = input(two_bus(10.0), &sampling, &config);

    let mut builder = ModelBuilder::new(&input);
    assert!(builder.model().rows().is_empty());
    // Two buses, two hours
    assert_eq!(builder.build_family(ConstraintFamily::Balance), 4);
    assert_eq!(builder.build_family(ConstraintFamily::CapacityEvolution), 1);
    assert_eq!(builder.build_family(ConstraintFamily::CapacityBound), 0);
    assert_eq!(builder.variables().ens.iter().flatten().count(), 2);
    let model = builder.finish();
    assert!(model.objective().is_empty());
}
