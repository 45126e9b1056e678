//! The thermal and electrical balance constraints.
//!
//! These are the rows that tie the cooling subsystem and the base electrical model together:
//! the thermal balance sums the enabled cooling sources against the cold-room demand, and the
//! electrical balance extends the base supply-demand equality with the cooling technologies'
//! electric draw.
use crate::dispatch::VariableMap;
use crate::model::Model;
use highs::RowProblem as Problem;
use log::warn;

/// Add the thermal balance constraints.
///
/// For every period, the cooling delivered by the enabled sources must meet the cold-room
/// demand:
///
/// `compressor_cooling(t) + tes_discharge(t) * cooling_energy_per_kg >= cooling_demand(t)`
///
/// Over-supply is allowed and simply discarded; there is no mechanism to bank surplus cooling
/// beyond what the TES state of charge already captures. Disabled technologies contribute no
/// terms; if demand is positive while every source is disabled, the row is still added (the
/// solver will report infeasibility) and a warning is logged.
pub fn add_thermal_balance_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) {
    if model.series.has_cooling_demand()
        && !model.cooling.compressor.is_enabled()
        && !model.cooling.tes.is_enabled()
    {
        warn!("The model has a cooling demand but every cooling technology is disabled");
    }

    let mut terms = Vec::new();
    for period in model.horizon.iter() {
        if let Some(compressor) = &variables.compressor {
            terms.push((compressor.cooling_output[&period], 1.0));
        }
        if let (Some(tes), Some(parameters)) = (&variables.tes, model.cooling.tes.as_active()) {
            terms.push((
                tes.discharge[&period],
                parameters.cooling_energy_per_kg.value(),
            ));
        }

        let demand = model.series.cooling_demand(period).value();
        problem.add_row(demand.., terms.drain(0..));
    }
}

/// Add the electrical balance constraints.
///
/// For every period, an exact supply-demand equality:
///
/// `(1 - loss) * (pv(t) + generator(t) + grid_import(t))
///   + discharge_efficiency * battery_discharge(t) - battery_charge(t) - grid_export(t)
///   = demand(t) + compressor_electric(t) + tes_electric(t)`
///
/// with `pv(t) = pv_capacity * pv_yield(t)`. The cooling technologies' draw appears as negative
/// supply so the village demand can stay on the right-hand side as a constant.
pub fn add_electrical_balance_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) {
    let supply_factor = 1.0 - model.electrical.distribution_losses.value();
    let discharge_efficiency = model.electrical.battery.discharge_efficiency.value();
    let electrical = &variables.electrical;

    let mut terms = Vec::new();
    for period in model.horizon.iter() {
        terms.push((
            electrical.pv_capacity,
            model.series.pv_yield(period).value() * supply_factor,
        ));
        terms.push((electrical.generator_output[&period], supply_factor));
        if let Some(import) = electrical.grid_import.get(&period) {
            terms.push((*import, supply_factor));
        }
        if let Some(export) = electrical.grid_export.get(&period) {
            terms.push((*export, -1.0));
        }
        terms.push((
            electrical.battery_discharge[&period],
            discharge_efficiency,
        ));
        terms.push((electrical.battery_charge[&period], -1.0));

        if let Some(compressor) = &variables.compressor {
            terms.push((compressor.electric_input[&period], -1.0));
        }
        if let Some(tes) = &variables.tes {
            terms.push((tes.electric_input[&period], -1.0));
        }

        let demand = model.series.electricity_demand(period).value();
        problem.add_row(demand..=demand, terms.drain(0..));
    }
}
