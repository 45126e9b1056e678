//! The base electrical microgrid: PV, dispatchable generator, battery storage and grid
//! connection.
//!
//! PV production is the installed capacity scaled by the per-period yield series, so it needs no
//! per-period variable of its own. The battery state of charge follows the same recursion shape
//! as the ice store, without standing losses: conversion losses are split between a charge
//! efficiency (applied on the way into the store) and a discharge efficiency (applied at the
//! busbar).
use crate::costs::capacity_objective_coefficient;
use crate::dispatch::{Variable, VariableRegistry};
use crate::horizon::Period;
use crate::model::Model;
use crate::technology::GridConnection;
use highs::RowProblem as Problem;
use indexmap::IndexMap;
use itertools::Itertools;

/// The decision variables of the base electrical model
pub struct ElectricalVariables {
    /// Installed PV capacity [kW]
    pub pv_capacity: Variable,
    /// Installed generator capacity [kW]
    pub generator_capacity: Variable,
    /// Installed battery capacity [kWh]
    pub battery_capacity: Variable,
    /// Generator output, per period [kW]
    pub generator_output: IndexMap<Period, Variable>,
    /// Electricity imported from the grid, per period [kW] (empty without a grid connection)
    pub grid_import: IndexMap<Period, Variable>,
    /// Electricity exported to the grid, per period [kW] (empty unless sale is allowed)
    pub grid_export: IndexMap<Period, Variable>,
    /// Battery charging power, per period [kW]
    pub battery_charge: IndexMap<Period, Variable>,
    /// Battery discharging power, per period [kW]
    pub battery_discharge: IndexMap<Period, Variable>,
    /// Battery state of charge at the end of each period [kWh]
    pub battery_soc: IndexMap<Period, Variable>,
}

/// Add the electrical model's variables to the problem.
///
/// Grid import and export are bounded per period by the connection limit scaled by the
/// availability series; the bounds are plain column bounds since availability is data, not a
/// variable.
pub fn add_variables(
    problem: &mut Problem,
    registry: &mut VariableRegistry,
    model: &Model,
) -> ElectricalVariables {
    let electrical = &model.electrical;
    let dt = model.horizon.delta_time.value();

    let pv_capacity_cost = capacity_objective_coefficient(
        electrical.pv.specific_investment_cost,
        electrical.pv.om_cost_fraction,
    );
    let pv_capacity = match electrical.pv.max_capacity {
        Some(max_capacity) => problem.add_column(pv_capacity_cost, 0.0..=max_capacity.value()),
        None => problem.add_column(pv_capacity_cost, 0.0..),
    };
    registry.track(pv_capacity);

    let generator_capacity_cost = capacity_objective_coefficient(
        electrical.generator.specific_investment_cost,
        electrical.generator.om_cost_fraction,
    );
    let generator_capacity = match electrical.generator.max_capacity {
        Some(max_capacity) => {
            problem.add_column(generator_capacity_cost, 0.0..=max_capacity.value())
        }
        None => problem.add_column(generator_capacity_cost, 0.0..),
    };
    registry.track(generator_capacity);

    let battery_capacity_cost = capacity_objective_coefficient(
        electrical.battery.specific_investment_cost,
        electrical.battery.om_cost_fraction,
    );
    let battery_capacity = match electrical.battery.max_capacity {
        Some(max_capacity) => problem.add_column(battery_capacity_cost, 0.0..=max_capacity.value()),
        None => problem.add_column(battery_capacity_cost, 0.0..),
    };
    registry.track(battery_capacity);

    let fuel_cost = electrical.generator.fuel_cost.value() * dt;

    let mut variables = ElectricalVariables {
        pv_capacity,
        generator_capacity,
        battery_capacity,
        generator_output: IndexMap::with_capacity(model.horizon.len()),
        grid_import: IndexMap::new(),
        grid_export: IndexMap::new(),
        battery_charge: IndexMap::with_capacity(model.horizon.len()),
        battery_discharge: IndexMap::with_capacity(model.horizon.len()),
        battery_soc: IndexMap::with_capacity(model.horizon.len()),
    };

    for period in model.horizon.iter() {
        variables
            .generator_output
            .insert(period, registry.track(problem.add_column(fuel_cost, 0.0..)));
        variables
            .battery_charge
            .insert(period, registry.track(problem.add_column(0.0, 0.0..)));
        variables
            .battery_discharge
            .insert(period, registry.track(problem.add_column(0.0, 0.0..)));
        variables
            .battery_soc
            .insert(period, registry.track(problem.add_column(0.0, 0.0..)));
    }

    match &model.grid {
        GridConnection::Off => {}
        GridConnection::Purchase {
            max_import,
            purchase_price,
        } => {
            add_grid_import_variables(
                problem,
                registry,
                &mut variables,
                model,
                max_import.value(),
                purchase_price.value() * dt,
            );
        }
        GridConnection::PurchaseAndSale {
            max_import,
            purchase_price,
            max_export,
            sale_price,
        } => {
            add_grid_import_variables(
                problem,
                registry,
                &mut variables,
                model,
                max_import.value(),
                purchase_price.value() * dt,
            );
            for period in model.horizon.iter() {
                let bound = max_export.value() * model.series.grid_availability(period).value();
                // Sold electricity earns revenue, hence the negative objective coefficient
                let var = problem.add_column(-sale_price.value() * dt, 0.0..=bound);
                variables.grid_export.insert(period, registry.track(var));
            }
        }
    }

    variables
}

fn add_grid_import_variables(
    problem: &mut Problem,
    registry: &mut VariableRegistry,
    variables: &mut ElectricalVariables,
    model: &Model,
    max_import: f64,
    import_cost: f64,
) {
    for period in model.horizon.iter() {
        let bound = max_import * model.series.grid_availability(period).value();
        let var = problem.add_column(import_cost, 0.0..=bound);
        variables.grid_import.insert(period, registry.track(var));
    }
}

/// Add the electrical model's constraints to the problem.
///
/// For every period:
/// - generator output is limited by the installed generator capacity
/// - battery charge and discharge power are limited by the rate limit times the installed
///   battery capacity
/// - the battery state of charge is limited by the installed battery capacity and follows
///   `soc(t) = soc(t-1) + (charge_efficiency*charge(t) - discharge(t))*dt`, starting empty
pub fn add_constraints(problem: &mut Problem, variables: &ElectricalVariables, model: &Model) {
    let battery = &model.electrical.battery;
    let dt = model.horizon.delta_time.value();
    let rate_limit = battery.rate_limit.value();
    let charge_efficiency = battery.charge_efficiency.value();

    for period in model.horizon.iter() {
        problem.add_row(
            ..=0.0,
            [
                (variables.generator_output[&period], 1.0),
                (variables.generator_capacity, -1.0),
            ],
        );
        problem.add_row(
            ..=0.0,
            [
                (variables.battery_charge[&period], 1.0),
                (variables.battery_capacity, -rate_limit),
            ],
        );
        problem.add_row(
            ..=0.0,
            [
                (variables.battery_discharge[&period], 1.0),
                (variables.battery_capacity, -rate_limit),
            ],
        );
        problem.add_row(
            ..=0.0,
            [
                (variables.battery_soc[&period], 1.0),
                (variables.battery_capacity, -1.0),
            ],
        );
    }

    // State-of-charge recursion, starting from an empty battery
    let first = *variables
        .battery_soc
        .keys()
        .next()
        .expect("Horizon is never empty");
    problem.add_row(
        0.0..=0.0,
        [
            (variables.battery_soc[&first], 1.0),
            (variables.battery_charge[&first], -charge_efficiency * dt),
            (variables.battery_discharge[&first], dt),
        ],
    );
    for (previous, period) in variables.battery_soc.keys().copied().tuple_windows() {
        problem.add_row(
            0.0..=0.0,
            [
                (variables.battery_soc[&period], 1.0),
                (variables.battery_soc[&previous], -1.0),
                (variables.battery_charge[&period], -charge_efficiency * dt),
                (variables.battery_discharge[&period], dt),
            ],
        );
    }
}
