//! Check family implementations. Each function inspects one aspect of the
//! network and reports into a [`Sink`] tagged with the family's category.

use crate::arena::ElementArena;
use crate::diagnostics::Diagnostics;
use crate::entities::*;
use crate::graph_utils::find_islands;
use crate::network::Network;
use std::collections::{HashMap, HashSet};

const EPS: f64 = 1e-9;

pub(super) struct Sink<'a> {
    category: &'static str,
    diag: &'a mut Diagnostics,
}

impl<'a> Sink<'a> {
    pub(super) fn new(category: &'static str, diag: &'a mut Diagnostics) -> Self {
        Self { category, diag }
    }

    fn error(&mut self, entity: &str, message: impl AsRef<str>) {
        self.diag
            .add_error_with_entity(self.category, message.as_ref(), entity);
    }

    fn warning(&mut self, entity: &str, message: impl AsRef<str>) {
        self.diag
            .add_warning_with_entity(self.category, message.as_ref(), entity);
    }

    fn global_error(&mut self, message: impl AsRef<str>) {
        self.diag.add_error(self.category, message.as_ref());
    }

    fn unknown(&mut self, owner: &str, kind: &str, name: &str) {
        self.error(owner, format!("references unknown {kind} '{name}'"));
    }

    fn series_len(&mut self, owner: &str, field: &str, len: usize, expected: usize) {
        if len != expected {
            self.error(
                owner,
                format!("{field} has {len} values, expected {expected}"),
            );
        }
    }

    /// Optional series: empty is allowed, otherwise one entry per year.
    fn optional_series_len(&mut self, owner: &str, field: &str, len: usize, expected: usize) {
        if len != 0 {
            self.series_len(owner, field, len, expected);
        }
    }

    fn unit_interval(&mut self, owner: &str, field: &str, values: impl IntoIterator<Item = f64>) {
        if let Some(bad) = values
            .into_iter()
            .find(|v| !(-EPS..=1.0 + EPS).contains(v))
        {
            self.error(owner, format!("{field} value {bad} is outside [0, 1]"));
        }
    }
}

fn is_binary(value: f64, tolerance: f64) -> bool {
    value.abs() <= tolerance || (value - 1.0).abs() <= tolerance
}

fn declared(list: &[String], name: &str) -> bool {
    list.iter().any(|item| item == name)
}

fn duplicates<T: NetworkElement>(arena: &ElementArena<T>, sink: &mut Sink) {
    for name in arena.duplicate_names() {
        sink.error(
            &format!("{} {}", T::KIND, name),
            format!("duplicate {} name '{}'", T::KIND, name),
        );
    }
}

pub(super) fn names(network: &Network, sink: &mut Sink) {
    duplicates(&network.buses, sink);
    duplicates(&network.lines, sink);
    duplicates(&network.generator_types, sink);
    duplicates(&network.storage_types, sink);
    duplicates(&network.generators, sink);
    duplicates(&network.storages, sink);
    duplicates(&network.fuels, sink);
    duplicates(&network.capacity_factors, sink);
    duplicates(&network.emission_fees, sink);
    duplicates(&network.transmission_fees, sink);
    duplicates(&network.demand_profiles, sink);
    duplicates(&network.local_balancing_stacks, sink);
    duplicates(&network.aggregated_consumers, sink);
    duplicates(&network.demand_chunks, sink);
    duplicates(&network.capacity_bounds, sink);
    duplicates(&network.generation_fractions, sink);
    duplicates(&network.dsr, sink);

    for (label, list) in [
        ("energy type", &network.energy_types),
        ("emission type", &network.emission_types),
    ] {
        let mut seen = HashSet::new();
        for name in list {
            if !seen.insert(name.as_str()) {
                sink.global_error(format!("duplicate {label} '{name}'"));
            }
        }
    }
}

pub(super) fn references(network: &Network, sink: &mut Sink) {
    for bus in &network.buses {
        if let Some(dsr) = &bus.dsr_type {
            if !network.dsr.contains(dsr) {
                sink.unknown(&bus.label(), "DSR", dsr);
            }
        }
    }

    for line in &network.lines {
        for bus in [&line.from, &line.to] {
            if !network.buses.contains(bus) {
                sink.unknown(&line.label(), "bus", bus);
            }
        }
        if let Some(fee) = &line.transmission_fee {
            if !network.transmission_fees.contains(fee) {
                sink.unknown(&line.label(), "transmission fee", fee);
            }
        }
    }

    for ty in &network.generator_types {
        if let Some(fuel) = &ty.fuel {
            if !network.fuels.contains(fuel) {
                sink.unknown(&ty.label(), "fuel", fuel);
            }
        }
        if let Some(factor) = &ty.capacity_factor {
            if !network.capacity_factors.contains(factor) {
                sink.unknown(&ty.label(), "capacity factor", factor);
            }
        }
    }

    for gen in &network.generators {
        let label = gen.label();
        if !network.generator_types.contains(&gen.generator_type) {
            sink.unknown(&label, "generator type", &gen.generator_type);
        }
        if gen.buses.is_empty() {
            sink.error(&label, "is not attached to any bus");
        }
        for bus in &gen.buses {
            if !network.buses.contains(bus) {
                sink.unknown(&label, "bus", bus);
            }
        }
        for fee in &gen.emission_fees {
            if !network.emission_fees.contains(fee) {
                sink.unknown(&label, "emission fee", fee);
            }
        }
    }

    for storage in &network.storages {
        let label = storage.label();
        if !network.storage_types.contains(&storage.storage_type) {
            sink.unknown(&label, "storage type", &storage.storage_type);
        }
        if !network.buses.contains(&storage.bus) {
            sink.unknown(&label, "bus", &storage.bus);
        }
    }

    for stack in &network.local_balancing_stacks {
        for bus in stack.buses.values() {
            if !network.buses.contains(bus) {
                sink.unknown(&stack.label(), "bus", bus);
            }
        }
    }

    for aggregate in &network.aggregated_consumers {
        let label = aggregate.label();
        if !network.demand_profiles.contains(&aggregate.demand_profile) {
            sink.unknown(&label, "demand profile", &aggregate.demand_profile);
        }
        for stack in aggregate.stacks() {
            if !network.local_balancing_stacks.contains(stack) {
                sink.unknown(&label, "local balancing stack", stack);
            }
        }
        for bounds in [
            &aggregate.min_fraction,
            &aggregate.max_fraction,
            &aggregate.max_fraction_increase,
            &aggregate.max_fraction_decrease,
        ] {
            for stack in bounds.keys() {
                if !aggregate.stack_base_fraction.contains_key(stack) {
                    sink.error(
                        &label,
                        format!("fraction bound for unused stack '{stack}'"),
                    );
                }
            }
        }
    }
}

pub(super) fn energy_types(network: &Network, sink: &mut Sink) {
    let energy_types = &network.energy_types;

    for bus in &network.buses {
        if !declared(energy_types, &bus.energy_type) {
            sink.error(
                &bus.label(),
                format!("energy type '{}' is not declared", bus.energy_type),
            );
        }
    }

    for line in &network.lines {
        for (end, name) in [("from", &line.from), ("to", &line.to)] {
            if let Some(bus) = network.buses.get(name) {
                if bus.energy_type != line.energy_type {
                    sink.error(
                        &line.label(),
                        format!(
                            "line carries '{}' but its {end} bus '{}' carries '{}'",
                            line.energy_type, bus.name, bus.energy_type
                        ),
                    );
                }
            }
        }
    }

    for ty in &network.generator_types {
        for (energy_type, efficiency) in &ty.efficiency {
            if !declared(energy_types, energy_type) {
                sink.error(
                    &ty.label(),
                    format!("output energy type '{energy_type}' is not declared"),
                );
            }
            if *efficiency < 0.0 {
                sink.error(
                    &ty.label(),
                    format!("efficiency for '{energy_type}' is negative"),
                );
            }
        }
        if ty.efficiency.is_empty() {
            sink.error(&ty.label(), "has no output energy type");
        }
        let total: f64 = ty.efficiency.values().sum();
        if total > 1.0 + EPS {
            sink.warning(
                &ty.label(),
                format!("efficiencies sum to {total}, more energy out than in"),
            );
        }
    }

    for gen in &network.generators {
        let Some(ty) = network.generator_types.get(&gen.generator_type) else {
            continue;
        };
        let mut connected: Vec<&str> = Vec::new();
        for name in &gen.buses {
            let Some(bus) = network.buses.get(name) else {
                continue;
            };
            if !ty.produces(&bus.energy_type) {
                sink.error(
                    &gen.label(),
                    format!(
                        "bus '{}' carries '{}' which type '{}' does not produce",
                        bus.name, bus.energy_type, ty.name
                    ),
                );
            }
            if connected.contains(&bus.energy_type.as_str()) {
                sink.error(
                    &gen.label(),
                    format!("more than one bus carries '{}'", bus.energy_type),
                );
            }
            connected.push(&bus.energy_type);
        }
        for output in ty.energy_types() {
            if !connected.contains(&output) {
                sink.warning(
                    &gen.label(),
                    format!("output '{output}' is not connected to any bus"),
                );
            }
        }
    }

    for ty in &network.storage_types {
        if !declared(energy_types, &ty.energy_type) {
            sink.error(
                &ty.label(),
                format!("energy type '{}' is not declared", ty.energy_type),
            );
        }
    }

    for storage in &network.storages {
        if let (Some(ty), Some(bus)) = (
            network.storage_types.get(&storage.storage_type),
            network.buses.get(&storage.bus),
        ) {
            if ty.energy_type != bus.energy_type {
                sink.error(
                    &storage.label(),
                    format!(
                        "stores '{}' but bus '{}' carries '{}'",
                        ty.energy_type, bus.name, bus.energy_type
                    ),
                );
            }
        }
    }

    for stack in &network.local_balancing_stacks {
        for (energy_type, name) in &stack.buses {
            if !declared(energy_types, energy_type) {
                sink.error(
                    &stack.label(),
                    format!("energy type '{energy_type}' is not declared"),
                );
            }
            if let Some(bus) = network.buses.get(name) {
                if &bus.energy_type != energy_type {
                    sink.error(
                        &stack.label(),
                        format!(
                            "slot '{energy_type}' points at bus '{}' carrying '{}'",
                            bus.name, bus.energy_type
                        ),
                    );
                }
            }
        }
    }

    for profile in &network.demand_profiles {
        for energy_type in profile.normalized_profile.keys() {
            if !declared(energy_types, energy_type) {
                sink.error(
                    &profile.label(),
                    format!("energy type '{energy_type}' is not declared"),
                );
            }
        }
    }

    for aggregate in &network.aggregated_consumers {
        let profile = network.demand_profiles.get(&aggregate.demand_profile);
        for energy_type in aggregate.yearly_energy_usage.keys() {
            if !declared(energy_types, energy_type) {
                sink.error(
                    &aggregate.label(),
                    format!("energy type '{energy_type}' is not declared"),
                );
            }
            if let Some(profile) = profile {
                if !profile.normalized_profile.contains_key(energy_type) {
                    sink.error(
                        &aggregate.label(),
                        format!(
                            "demand profile '{}' has no shape for '{energy_type}'",
                            profile.name
                        ),
                    );
                }
            }
        }
    }
}

fn check_min_max(
    owner: &str,
    what: &str,
    min: &[Option<f64>],
    max: &[Option<f64>],
    n: usize,
    sink: &mut Sink,
) {
    for year in 0..n {
        if let (Some(lo), Some(hi)) = (year_value(min, year), year_value(max, year)) {
            if lo > hi + EPS {
                sink.error(
                    owner,
                    format!("min {what} {lo} exceeds max {what} {hi} in year {year}"),
                );
                return;
            }
        }
    }
}

fn check_technology_params(owner: &str, params: &TechnologyParams, n: usize, sink: &mut Sink) {
    if params.life_time == 0 {
        sink.error(owner, "life_time must be at least 1");
    }
    sink.series_len(owner, "capex", params.capex.len(), n);
    sink.series_len(owner, "opex", params.opex.len(), n);
    if params.capex.iter().chain(&params.opex).any(|v| !v.is_finite()) {
        sink.error(owner, "capex and opex must be finite");
    }
    for (field, series) in [
        ("min_capacity", &params.min_capacity),
        ("max_capacity", &params.max_capacity),
        ("min_capacity_increase", &params.min_capacity_increase),
        ("max_capacity_increase", &params.max_capacity_increase),
    ] {
        sink.optional_series_len(owner, field, series.len(), n);
        if series.iter().flatten().any(|v| *v < 0.0) {
            sink.error(owner, format!("{field} contains negative values"));
        }
    }
    check_min_max(owner, "capacity", &params.min_capacity, &params.max_capacity, n, sink);
    check_min_max(
        owner,
        "capacity increase",
        &params.min_capacity_increase,
        &params.max_capacity_increase,
        n,
        sink,
    );
}

fn check_instance(
    owner: &str,
    overrides: &CapacityOverrides,
    params: &TechnologyParams,
    base_capacity: f64,
    n: usize,
    sink: &mut Sink,
) {
    if !(base_capacity >= 0.0 && base_capacity.is_finite()) {
        sink.error(owner, format!("base capacity {base_capacity} must be non-negative"));
    }
    for (field, own, inherited) in overrides.pairs(params) {
        let Some(own) = own else { continue };
        sink.optional_series_len(owner, field, own.len(), n);
        let is_min = field.starts_with("min");
        for year in 0..n {
            let own_value = year_value(own, year);
            let (Some(value), Some(type_value)) = (own_value, year_value(inherited, year)) else {
                continue;
            };
            if is_min && value < type_value - EPS {
                sink.error(
                    owner,
                    format!("{field} {value} in year {year} is below the type bound {type_value}"),
                );
                break;
            }
            if !is_min && value > type_value + EPS {
                sink.error(
                    owner,
                    format!("{field} {value} in year {year} is above the type bound {type_value}"),
                );
                break;
            }
        }
    }

    let limits = overrides.resolve(params);
    if overrides.min_capacity.is_some() || overrides.max_capacity.is_some() {
        check_min_max(owner, "capacity", limits.min_capacity, limits.max_capacity, n, sink);
    }
    if let Some(max) = year_value(limits.max_capacity, 0) {
        if base_capacity > max + EPS {
            sink.error(
                owner,
                format!("base capacity {base_capacity} exceeds max capacity {max} in year 0"),
            );
        }
    }
}

pub(super) fn capacity_trajectories(network: &Network, sink: &mut Sink) {
    let n = network.n_years();
    for ty in &network.generator_types {
        check_technology_params(&ty.label(), &ty.params, n, sink);
    }
    for ty in &network.storage_types {
        check_technology_params(&ty.label(), &ty.params, n, sink);
    }
    for gen in &network.generators {
        if let Some(ty) = network.generator_types.get(&gen.generator_type) {
            check_instance(&gen.label(), &gen.overrides, &ty.params, gen.unit_base_cap, n, sink);
        }
    }
    for storage in &network.storages {
        if let Some(ty) = network.storage_types.get(&storage.storage_type) {
            check_instance(
                &storage.label(),
                &storage.overrides,
                &ty.params,
                storage.unit_base_cap,
                n,
                sink,
            );
        }
    }
}

fn unit_label(unit: CapacityUnit) -> &'static str {
    match unit {
        CapacityUnit::Power => "power",
        CapacityUnit::Energy => "energy",
    }
}

pub(super) fn capacity_bounds(network: &Network, sink: &mut Sink) {
    for bound in &network.capacity_bounds {
        let label = bound.label();
        let coefficient = bound.left_coefficient;
        if !coefficient.is_finite() || coefficient == 0.0 {
            sink.error(&label, "left_coefficient must be non-zero");
        } else if coefficient < 0.0 {
            sink.error(
                &label,
                format!(
                    "left_coefficient {coefficient} must be positive for {:?} bounds \
                     over non-negative capacities",
                    bound.sense
                ),
            );
        }

        let left = network.capacity_unit(&bound.left);
        let right = network.capacity_unit(&bound.right);
        if left.is_none() {
            sink.error(&label, format!("references unknown {}", bound.left));
        }
        if right.is_none() {
            sink.error(&label, format!("references unknown {}", bound.right));
        }
        if let (Some(l), Some(r)) = (left, right) {
            if l != r {
                sink.error(
                    &label,
                    format!(
                        "compares {} ({}) with {} ({}); capacity units differ",
                        bound.left,
                        unit_label(l),
                        bound.right,
                        unit_label(r)
                    ),
                );
            }
        }
        if let Some(aggregate) = &bound.aggregate {
            if !network.aggregated_consumers.contains(aggregate) {
                sink.unknown(&label, "aggregated consumer", aggregate);
            }
        }
        if bound.left == bound.right {
            sink.warning(&label, "compares a technology with itself");
        }
    }
}

pub(super) fn power_reserves(network: &Network, sink: &mut Sink) {
    let reserves = &network.constants.power_reserves;
    for (key, reserve) in reserves {
        let owner = format!("power reserve {key}");
        if !declared(&network.energy_types, &reserve.energy_type) {
            sink.error(
                &owner,
                format!("energy type '{}' is not declared", reserve.energy_type),
            );
        }
        sink.unit_interval(&owner, "fraction", [reserve.fraction]);
    }

    let mut used: HashSet<&str> = HashSet::new();
    for gen in &network.generators {
        let ty = network.generator_types.get(&gen.generator_type);
        for key in &gen.power_reserves {
            let Some(reserve) = reserves.get(key) else {
                sink.error(&gen.label(), format!("references undeclared power reserve '{key}'"));
                continue;
            };
            used.insert(key);
            let Some(ty) = ty else { continue };
            if !ty.produces(&reserve.energy_type) {
                sink.error(
                    &gen.label(),
                    format!(
                        "contributes to reserve '{key}' for '{}' which it does not produce",
                        reserve.energy_type
                    ),
                );
            }
            if !ty.is_dispatchable() {
                sink.warning(
                    &gen.label(),
                    format!("non-dispatchable unit cannot hold reserve '{key}'; ignored"),
                );
            }
        }
    }
    for storage in &network.storages {
        let ty = network.storage_types.get(&storage.storage_type);
        for key in &storage.power_reserves {
            let Some(reserve) = reserves.get(key) else {
                sink.error(
                    &storage.label(),
                    format!("references undeclared power reserve '{key}'"),
                );
                continue;
            };
            used.insert(key);
            if let Some(ty) = ty {
                if ty.energy_type != reserve.energy_type {
                    sink.error(
                        &storage.label(),
                        format!(
                            "contributes to reserve '{key}' for '{}' but stores '{}'",
                            reserve.energy_type, ty.energy_type
                        ),
                    );
                }
            }
        }
    }

    for key in reserves.keys() {
        if !used.contains(key.as_str()) {
            sink.warning(
                &format!("power reserve {key}"),
                "declared but no generator or storage contributes to it",
            );
        }
    }
}

pub(super) fn fractions(network: &Network, tolerance: f64, binary: bool, sink: &mut Sink) {
    let n = network.n_years();
    let mut owners: HashMap<&str, &str> = HashMap::new();

    for aggregate in &network.aggregated_consumers {
        let label = aggregate.label();
        if aggregate.stack_base_fraction.is_empty() {
            sink.error(&label, "has no local balancing stacks");
        }
        for (stack, fraction) in &aggregate.stack_base_fraction {
            sink.unit_interval(&label, &format!("base fraction of '{stack}'"), [*fraction]);
            if binary && !is_binary(*fraction, tolerance) {
                sink.error(
                    &label,
                    format!("binary base fraction of '{stack}' must be 0 or 1, got {fraction}"),
                );
            }
            if let Some(previous) = owners.insert(stack, &aggregate.name) {
                sink.error(
                    &label,
                    format!("stack '{stack}' is already used by aggregate '{previous}'"),
                );
            }
        }
        let total: f64 = aggregate.stack_base_fraction.values().sum();
        if !aggregate.stack_base_fraction.is_empty() && (total - 1.0).abs() > tolerance {
            sink.error(&label, format!("base fractions sum to {total}, expected 1"));
        }

        sink.series_len(&label, "n_consumers", aggregate.n_consumers.len(), n);
        if aggregate.n_consumers.iter().any(|v| *v < 0.0) {
            sink.error(&label, "n_consumers contains negative values");
        }
        for (energy_type, usage) in &aggregate.yearly_energy_usage {
            sink.series_len(
                &label,
                &format!("yearly_energy_usage[{energy_type}]"),
                usage.len(),
                n,
            );
        }

        for (field, bounds) in [
            ("min_fraction", &aggregate.min_fraction),
            ("max_fraction", &aggregate.max_fraction),
            ("max_fraction_increase", &aggregate.max_fraction_increase),
            ("max_fraction_decrease", &aggregate.max_fraction_decrease),
        ] {
            for (stack, series) in bounds {
                let field = format!("{field}[{stack}]");
                sink.optional_series_len(&label, &field, series.len(), n);
                sink.unit_interval(&label, &field, series.iter().flatten().copied());
            }
        }
        if binary {
            for (field, bounds) in [
                ("min_fraction", &aggregate.min_fraction),
                ("max_fraction", &aggregate.max_fraction),
            ] {
                for (stack, series) in bounds {
                    let years = series
                        .iter()
                        .enumerate()
                        .filter_map(|(year, v)| v.map(|v| (year, v)))
                        .filter(|(_, v)| !is_binary(*v, tolerance));
                    for (year, value) in years {
                        let message = format!(
                            "binary {field}[{stack}] must be 0 or 1, got {value} in year {year}"
                        );
                        sink.error(&label, message);
                    }
                }
            }
        }

        for year in 0..n {
            let mut min_sum = 0.0;
            let mut max_sum = 0.0;
            for stack in aggregate.stacks() {
                let lo = aggregate
                    .min_fraction
                    .get(stack)
                    .and_then(|s| year_value(s, year));
                let hi = aggregate
                    .max_fraction
                    .get(stack)
                    .and_then(|s| year_value(s, year));
                if let (Some(lo), Some(hi)) = (lo, hi) {
                    if lo > hi + EPS {
                        sink.error(
                            &label,
                            format!("min fraction of '{stack}' exceeds its max in year {year}"),
                        );
                    }
                }
                min_sum += lo.unwrap_or(0.0);
                max_sum += hi.unwrap_or(1.0);
            }
            if min_sum > 1.0 + tolerance {
                sink.error(
                    &label,
                    format!("minimum fractions sum to {min_sum} in year {year}, above 1"),
                );
            }
            if max_sum < 1.0 - tolerance {
                sink.error(
                    &label,
                    format!("maximum fractions sum to {max_sum} in year {year}, below 1"),
                );
            }
        }
    }

    for dsr in &network.dsr {
        let label = dsr.label();
        if !(dsr.compensation_factor > 0.0) {
            sink.error(&label, "compensation_factor must be positive");
        }
        if dsr.balancing_period_len == 0 {
            sink.error(&label, "balancing_period_len must be at least one hour");
        }
        if dsr.penalization < 0.0 {
            sink.error(&label, "penalization must be non-negative");
        }
        if let Some(limit) = dsr.relative_shift_limit {
            sink.unit_interval(&label, "relative_shift_limit", [limit]);
        }
        if dsr.abs_shift_limit.is_some_and(|limit| limit < 0.0) {
            sink.error(&label, "abs_shift_limit must be non-negative");
        }
    }
}

pub(super) fn generation_fractions(network: &Network, sink: &mut Sink) {
    let n = network.n_years();
    for fraction in &network.generation_fractions {
        let label = fraction.label();
        if !declared(&network.energy_types, &fraction.energy_type) {
            sink.error(
                &label,
                format!("energy type '{}' is not declared", fraction.energy_type),
            );
        }
        for tag in [&fraction.tag, &fraction.sub_tag] {
            if !network.tag_in_use(tag) {
                sink.error(
                    &label,
                    format!("tag '{tag}' is not carried by any generator or storage"),
                );
            }
        }
        let min = &fraction.min_generation_fraction;
        let max = &fraction.max_generation_fraction;
        sink.optional_series_len(&label, "min_generation_fraction", min.len(), n);
        sink.optional_series_len(&label, "max_generation_fraction", max.len(), n);
        sink.unit_interval(&label, "min_generation_fraction", min.iter().flatten().copied());
        sink.unit_interval(&label, "max_generation_fraction", max.iter().flatten().copied());
        check_min_max(&label, "generation fraction", min, max, n, sink);
        if min.iter().chain(max).all(Option::is_none) {
            sink.warning(&label, "has no bounds in any year");
        }
    }
}

pub(super) fn demand_chunks(network: &Network, sink: &mut Sink) {
    let n_hours = network.n_hours();
    let n_years = network.n_years();
    for chunk in &network.demand_chunks {
        let label = chunk.label();
        if !declared(&network.energy_types, &chunk.energy_type) {
            sink.error(
                &label,
                format!("energy type '{}' is not declared", chunk.energy_type),
            );
        }
        if !network.tag_in_use(&chunk.tag) {
            sink.error(
                &label,
                format!("tag '{}' is not carried by any generator or storage", chunk.tag),
            );
        }
        if chunk.periods.is_empty() {
            sink.warning(&label, "has no periods");
        }
        for (i, &(start, end)) in chunk.periods.iter().enumerate() {
            if start >= end || end > n_hours {
                sink.error(
                    &label,
                    format!("period {i} [{start}, {end}) is not a window within [0, {n_hours})"),
                );
            }
        }
        sink.series_len(&label, "demand periods", chunk.demand.len(), chunk.periods.len());
        for (i, row) in chunk.demand.iter().enumerate() {
            sink.series_len(&label, &format!("demand[{i}]"), row.len(), n_years);
            if row.iter().any(|v| *v < 0.0) {
                sink.error(&label, format!("demand[{i}] contains negative values"));
            }
        }
    }
}

pub(super) fn parameters(network: &Network, sink: &mut Sink) {
    let n_years = network.n_years();
    let n_hours = network.n_hours();
    let constants = &network.constants;
    if n_years == 0 {
        sink.global_error("n_years must be at least 1");
    }
    if n_hours == 0 {
        sink.global_error("n_hours must be at least 1");
    }

    for (limits, relative) in [
        (&constants.relative_emission_limits, true),
        (&constants.absolute_emission_limits, false),
    ] {
        let kind = if relative { "relative" } else { "absolute" };
        for (emission_type, series) in limits {
            let owner = format!("{kind} emission limit {emission_type}");
            if !declared(&network.emission_types, emission_type) {
                sink.error(&owner, "emission type is not declared");
            }
            sink.series_len(&owner, "limit", series.len(), n_years);
            if relative && !constants.base_total_emission.contains_key(emission_type) {
                sink.error(&owner, "relative limit requires a base_total_emission");
            }
        }
    }
    for (emission_type, base) in &constants.base_total_emission {
        if *base < 0.0 {
            sink.error(
                &format!("base total emission {emission_type}"),
                "must be non-negative",
            );
        }
    }

    for line in &network.lines {
        if !(0.0..1.0).contains(&line.transmission_loss) {
            sink.error(&line.label(), "transmission_loss must lie in [0, 1)");
        }
        if !(line.max_capacity >= 0.0) {
            sink.error(&line.label(), "max_capacity must be non-negative");
        }
    }

    for fuel in &network.fuels {
        let label = fuel.label();
        if !(fuel.energy_per_unit > 0.0) {
            sink.error(&label, "energy_per_unit must be positive");
        }
        sink.series_len(&label, "cost", fuel.cost.len(), n_years);
        sink.optional_series_len(&label, "availability", fuel.availability.len(), n_years);
        for (emission_type, factor) in &fuel.emission {
            if !declared(&network.emission_types, emission_type) {
                sink.error(
                    &label,
                    format!("emission type '{emission_type}' is not declared"),
                );
            }
            if *factor < 0.0 {
                sink.error(&label, format!("emission factor for '{emission_type}' is negative"));
            }
        }
    }

    for factor in &network.capacity_factors {
        sink.series_len(&factor.label(), "profile", factor.profile.len(), n_hours);
        sink.unit_interval(&factor.label(), "profile", factor.profile.iter().copied());
    }

    for fee in &network.emission_fees {
        if !declared(&network.emission_types, &fee.emission_type) {
            sink.error(
                &fee.label(),
                format!("emission type '{}' is not declared", fee.emission_type),
            );
        }
        sink.series_len(&fee.label(), "price", fee.price.len(), n_years);
    }

    for fee in &network.transmission_fees {
        sink.series_len(&fee.label(), "fee", fee.fee.len(), n_hours);
    }

    for profile in &network.demand_profiles {
        for (energy_type, shape) in &profile.normalized_profile {
            let field = format!("normalized_profile[{energy_type}]");
            sink.series_len(&profile.label(), &field, shape.len(), n_hours);
            if shape.iter().any(|v| *v < 0.0) {
                sink.error(&profile.label(), format!("{field} contains negative values"));
            }
            let total: f64 = shape.iter().sum();
            if (total - 1.0).abs() > 1e-3 {
                sink.warning(
                    &profile.label(),
                    format!("{field} sums to {total}, expected 1"),
                );
            }
        }
    }

    for ty in &network.generator_types {
        let label = ty.label();
        sink.optional_series_len(&label, "power_utilization", ty.power_utilization.len(), n_years);
        sink.optional_series_len(
            &label,
            "minimal_power_utilization",
            ty.minimal_power_utilization.len(),
            n_years,
        );
        sink.unit_interval(
            &label,
            "power_utilization",
            ty.power_utilization.iter().flatten().copied(),
        );
        sink.unit_interval(
            &label,
            "minimal_power_utilization",
            ty.minimal_power_utilization.iter().flatten().copied(),
        );
        check_min_max(
            &label,
            "power utilization",
            &ty.minimal_power_utilization,
            &ty.power_utilization,
            n_years,
            sink,
        );
        for (field, series) in [
            ("generation_compensation", &ty.generation_compensation),
            ("energy_curtailment_cost", &ty.energy_curtailment_cost),
        ] {
            sink.optional_series_len(&label, field, series.len(), n_years);
        }
        if ty.energy_curtailment_cost.iter().any(|v| *v < 0.0) {
            sink.error(&label, "energy_curtailment_cost contains negative values");
        }
        for (field, ramp) in [("ramp_up", ty.ramp_up), ("ramp_down", ty.ramp_down)] {
            if let Some(ramp) = ramp {
                sink.unit_interval(&label, field, [ramp]);
            }
        }
        for (emission_type, reduction) in &ty.emission_reduction {
            if !declared(&network.emission_types, emission_type) {
                sink.error(
                    &label,
                    format!("emission type '{emission_type}' is not declared"),
                );
            }
            let field = format!("emission_reduction[{emission_type}]");
            sink.series_len(&label, &field, reduction.len(), n_years);
            sink.unit_interval(&label, &field, reduction.iter().copied());
        }
        if ty.fuel.is_none() && !ty.emission_reduction.is_empty() {
            sink.warning(&label, "emission_reduction has no effect without a fuel");
        }
    }

    for ty in &network.storage_types {
        let label = ty.label();
        for (field, value) in [
            ("generation_efficiency", ty.generation_efficiency),
            ("load_efficiency", ty.load_efficiency),
        ] {
            if !(value > 0.0 && value <= 1.0 + EPS) {
                sink.error(&label, format!("{field} {value} must lie in (0, 1]"));
            }
        }
        if !(ty.power_to_capacity > 0.0) {
            sink.error(&label, "power_to_capacity must be positive");
        }
        if !(0.0..1.0).contains(&ty.energy_loss) {
            sink.error(&label, "energy_loss must lie in [0, 1)");
        }
        if ty.cycle_length == Some(0) {
            sink.error(&label, "cycle_length must be at least one hour");
        }
    }
}

pub(super) fn topology(network: &Network, sink: &mut Sink) {
    let analysis = find_islands(network);
    let n_buses = network.buses.len();

    let mut supplied = vec![false; n_buses];
    let mut demand = vec![false; n_buses];
    let mut attached = vec![false; n_buses];
    for gen in &network.generators {
        for bus in gen.buses.iter().filter_map(|b| network.buses.position(b)) {
            supplied[bus] = true;
            attached[bus] = true;
        }
    }
    for storage in &network.storages {
        if let Some(bus) = network.buses.position(&storage.bus) {
            supplied[bus] = true;
            attached[bus] = true;
        }
    }
    for stack in &network.local_balancing_stacks {
        for bus in stack.buses.values().filter_map(|b| network.buses.position(b)) {
            demand[bus] = true;
            attached[bus] = true;
        }
    }
    for line in &network.lines {
        for bus in [&line.from, &line.to]
            .into_iter()
            .filter_map(|b| network.buses.position(b))
        {
            attached[bus] = true;
        }
    }

    for (position, bus) in network.buses.iter().enumerate() {
        if !attached[position] {
            sink.warning(&bus.label(), "is not connected to any line, unit or stack");
        }
    }

    for island in &analysis.islands {
        let has_demand = island.buses.iter().any(|b| demand[b.index()]);
        let has_supply = island.buses.iter().any(|b| supplied[b.index()]);
        if has_demand && !has_supply {
            let names: Vec<&str> = island
                .buses
                .iter()
                .map(|b| network.buses[b.index()].name.as_str())
                .collect();
            sink.warning(
                &format!("island {}", island.island_id),
                format!(
                    "buses [{}] carry demand but no generator or storage can reach them",
                    names.join(", ")
                ),
            );
        }
    }
}
