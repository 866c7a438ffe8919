use mep_core::*;

/// Two electricity buses joined by a line, one heat bus, a CHP plant feeding
/// both energy types, a battery and a single consumer aggregate.
fn sample_network() -> Network {
    let mut network = Network::new(NetworkConstants::new(2, 3))
        .with_energy_types(["electricity", "heat"])
        .with_emission_types(["CO2"]);

    network.add_bus(Bus::new("EE_1", "electricity")).unwrap();
    network.add_bus(Bus::new("EE_2", "electricity")).unwrap();
    network.add_bus(Bus::new("H_1", "heat")).unwrap();
    network
        .add_line(Line::new("L_1", "electricity", "EE_1", "EE_2", 100.0))
        .unwrap();

    network
        .add_fuel(Fuel {
            name: "coal".into(),
            emission: [("CO2".to_string(), 0.9)].into_iter().collect(),
            availability: Vec::new(),
            cost: vec![1.0, 1.0],
            energy_per_unit: 1.0,
        })
        .unwrap();

    let mut chp = GeneratorType::new("chp", TechnologyParams::flat(20, 2, 100.0, 5.0))
        .with_output("electricity", 0.4)
        .with_output("heat", 0.4);
    chp.fuel = Some("coal".into());
    network.add_generator_type(chp).unwrap();
    network
        .add_generator(
            Generator::new("CHP_1", "chp")
                .with_bus("EE_1")
                .with_bus("H_1")
                .with_base_capacity(10.0),
        )
        .unwrap();

    network
        .add_storage_type(StorageType::new(
            "battery",
            "electricity",
            TechnologyParams::flat(10, 2, 50.0, 1.0),
        ))
        .unwrap();
    network
        .add_storage(Storage::new("B_1", "battery", "EE_2"))
        .unwrap();

    network
        .add_demand_profile(
            DemandProfile::new("household")
                .with_profile("electricity", vec![0.25, 0.25, 0.5])
                .with_profile("heat", vec![0.5, 0.25, 0.25]),
        )
        .unwrap();
    network
        .add_local_balancing_stack(
            LocalBalancingStack::new("LBS_1")
                .with_bus("electricity", "EE_2")
                .with_bus("heat", "H_1"),
        )
        .unwrap();
    network
        .add_aggregated_consumer(AggregatedConsumer {
            n_consumers: vec![100.0, 100.0],
            ..AggregatedConsumer::new("households", "household")
                .with_stack("LBS_1", 1.0)
                .with_usage("electricity", vec![1.0, 1.0])
                .with_usage("heat", vec![2.0, 2.0])
        })
        .unwrap();
    network
}

#[test]
fn sample_network_is_valid() {
    let network = sample_network();
    let diagnostics = network.validate(ValidationMode::Collect);
    assert!(!diagnostics.has_errors(), "{diagnostics}");
    assert!(!diagnostics.has_warnings(), "{diagnostics}");
}

#[test]
fn dangling_bus_reference_is_named() {
    let mut network = sample_network();
    network
        .add_generator(Generator::new("PP_1", "chp").with_bus("EE_9"))
        .unwrap();

    let errors = validate(&network, ValidationMode::Strict);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, "reference");
    assert!(errors[0].message.contains("'EE_9'"));
    assert_eq!(errors[0].entity.as_deref(), Some("generator PP_1"));
}

#[test]
fn strict_stops_at_first_failing_family() {
    let mut network = sample_network();
    network
        .add_storage(Storage::new("B_2", "battery", "EE_9"))
        .unwrap();
    network
        .add_line(Line::new("L_2", "electricity", "EE_2", "EE_1", 10.0).with_loss(1.5))
        .unwrap();

    let strict = validate(&network, ValidationMode::Strict);
    let collected = validate(&network, ValidationMode::Collect);

    assert_eq!(strict.len(), 1);
    assert_eq!(collected.len(), 2);
    assert!(collected.iter().any(|e| e.category == "parameter"));
}

#[test]
fn failed_validation_drops_network_with_report() {
    let mut network = sample_network();
    network
        .add_storage(Storage::new("B_2", "battery", "EE_9"))
        .unwrap();

    let err = network.into_validated(ValidationMode::Collect).unwrap_err();
    let report = match err {
        MepError::Validation(report) => report,
        other => panic!("expected validation error, got {other}"),
    };
    assert_eq!(report.error_count(), 1);
    assert!(report.to_string().contains("EE_9"));
}

#[test]
fn capacity_bound_units_must_match() {
    let mut network = sample_network();
    network
        .add_capacity_bound(CapacityBound::new(
            "chp_vs_battery",
            TechnologyRef::Generator("CHP_1".into()),
            BoundSense::Leq,
            TechnologyRef::StorageType("battery".into()),
        ))
        .unwrap();

    let errors = validate(&network, ValidationMode::Collect);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, "capacity_bound");
    assert!(errors[0].message.contains("units differ"));
}

#[test]
fn capacity_bound_rejects_non_positive_coefficient() {
    let mut network = sample_network();
    let mut bound = CapacityBound::new(
        "chp_vs_chp_type",
        TechnologyRef::Generator("CHP_1".into()),
        BoundSense::Eq,
        TechnologyRef::GeneratorType("chp".into()),
    );
    bound.left_coefficient = 0.0;
    network.add_capacity_bound(bound).unwrap();

    let errors = validate(&network, ValidationMode::Collect);
    assert!(errors.iter().any(|e| e.message.contains("non-zero")));
}

#[test]
fn unused_reserve_is_only_a_warning() {
    let mut network = sample_network();
    network
        .add_power_reserve(
            "spinning",
            PowerReserve {
                energy_type: "electricity".into(),
                fraction: 0.1,
            },
        )
        .unwrap();

    let validated = network.into_validated(ValidationMode::Strict).unwrap();
    let warnings: Vec<_> = validated.warnings().warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].category, "power_reserve");
}

#[test]
fn undeclared_reserve_is_an_error() {
    let mut network = sample_network();
    network.generators = vec![Generator {
        power_reserves: vec!["spinning".into()],
        ..Generator::new("CHP_1", "chp").with_bus("EE_1").with_bus("H_1")
    }]
    .into();

    let errors = validate(&network, ValidationMode::Collect);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("'spinning'"));
}

#[test]
fn base_fractions_must_sum_to_one() {
    let mut network = sample_network();
    network
        .add_local_balancing_stack(
            LocalBalancingStack::new("LBS_2").with_bus("electricity", "EE_1"),
        )
        .unwrap();
    network
        .add_aggregated_consumer(AggregatedConsumer {
            n_consumers: vec![1.0, 1.0],
            ..AggregatedConsumer::new("offices", "household")
                .with_stack("LBS_2", 0.6)
                .with_usage("electricity", vec![1.0, 1.0])
        })
        .unwrap();

    let errors = validate(&network, ValidationMode::Collect);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, "fraction");
    assert!(errors[0].message.contains("sum to"));
}

#[test]
fn instance_bounds_must_lie_within_type_bounds() {
    let mut network = sample_network();
    let mut params = TechnologyParams::flat(20, 2, 10.0, 1.0);
    params.max_capacity = vec![Some(50.0), Some(50.0)];
    network
        .add_generator_type(GeneratorType::new("boiler", params).with_output("heat", 0.9))
        .unwrap();

    let mut boiler = Generator::new("HB_1", "boiler").with_bus("H_1");
    boiler.overrides.max_capacity = Some(vec![Some(40.0), Some(60.0)]);
    network.add_generator(boiler).unwrap();

    let errors = validate(&network, ValidationMode::Collect);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, "capacity");
    assert!(errors[0].message.contains("year 1"));
}

#[test]
fn demand_chunk_periods_must_fit_the_horizon() {
    let mut network = sample_network();
    network.generators = vec![Generator::new("CHP_1", "chp")
        .with_bus("EE_1")
        .with_bus("H_1")
        .with_tag("base_load")]
    .into();
    network
        .add_demand_chunk(DemandChunk {
            name: "night".into(),
            tag: "base_load".into(),
            energy_type: "electricity".into(),
            periods: vec![(0, 2), (2, 5)],
            demand: vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        })
        .unwrap();

    let errors = validate(&network, ValidationMode::Collect);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, "demand_chunk");
}

#[test]
fn isolated_bus_is_a_topology_warning() {
    let mut network = sample_network();
    network.add_bus(Bus::new("EE_3", "electricity")).unwrap();

    let diagnostics = network.validate(ValidationMode::Strict);
    assert!(!diagnostics.has_errors());
    let warnings: Vec<_> = diagnostics.issues_by_category("topology").collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].entity.as_deref(), Some("bus EE_3"));
}

#[test]
fn binary_fractions_need_zero_or_one() {
    let mut network = sample_network();
    for stack in ["LBS_2", "LBS_3"] {
        network
            .add_local_balancing_stack(
                LocalBalancingStack::new(stack).with_bus("electricity", "EE_1"),
            )
            .unwrap();
    }
    let mut offices = AggregatedConsumer::new("offices", "household")
        .with_stack("LBS_2", 0.5)
        .with_stack("LBS_3", 0.5)
        .with_usage("electricity", vec![1.0, 1.0]);
    offices.n_consumers = vec![1.0, 1.0];
    offices
        .min_fraction
        .insert("LBS_2".to_string(), vec![None, Some(0.3)]);
    network.add_aggregated_consumer(offices).unwrap();

    assert!(validate(&network, ValidationMode::Collect).is_empty());

    let binary = NetworkValidator::new(ValidationMode::Collect).with_binary_fraction(true);
    let diagnostics = binary.run(&network);
    let messages: Vec<&str> = diagnostics.errors().map(|e| e.message.as_str()).collect();
    assert_eq!(messages.len(), 3, "{messages:?}");
    assert!(diagnostics.errors().all(|e| e.category == "fraction"));
    assert!(messages.iter().any(|m| m.contains("base fraction of 'LBS_3'")));
    assert!(messages.iter().any(|m| m.contains("min_fraction[LBS_2]") && m.contains("year 1")));
}

#[test]
fn binary_fraction_follows_config() {
    let config = OptimizationConfig {
        binary_fraction: true,
        ..OptimizationConfig::default()
    };
    assert!(sample_network().into_validated_with(&config.validator()).is_ok());
}
