//! The ice thermal energy store.
//!
//! A compressor freezes water into an insulated tank; the stored ice is later melted through a
//! heat exchanger to cool the cold room. The state of charge is the mass of ice in the tank and
//! is the only state carried between periods. Charging and discharging are independent
//! continuous flows: running both in the same period is physically wasteful but not forbidden,
//! so the model measures the overlap and prices it in the objective instead of excluding it.
//!
//! Per period, the store is governed by:
//!
//! - the state-of-charge recursion
//!   `soc(t) = (soc(t-1) + charge(t)*dt) * storage_efficiency - discharge(t)*dt`,
//!   with the standing loss applied to the stock carried through the period, charge included;
//! - the production coupling `ice_production(t) * cooling_energy_per_kg = cop * electric_input(t)`;
//! - the identity `charge(t) = ice_production(t)` (all ice produced goes into the tank);
//! - capacity bounds on the compressor's electric draw and, equivalently, on ice production.
//!
//! Cooling delivered to the cold room is `discharge(t) * cooling_energy_per_kg`; the thermal
//! balance consumes that expression directly rather than through a separate variable.
use crate::dispatch::{Variable, VariableRegistry};
use crate::horizon::{Horizon, Period};
use crate::input::{deserialise_proportion, deserialise_proportion_nonzero};
use crate::units::{
    Dimensionless, EnergyPerMass, Hours, Mass, MassRate, MoneyPerMass, MoneyPerPower, Power,
};
use anyhow::{Result, ensure};
use highs::RowProblem as Problem;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;

/// Parameters for the ice thermal energy store
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TesParameters {
    /// Coefficient of performance of the TES compressor
    pub cop: Dimensionless,
    /// Cooling energy stored in a kg of ice [kWh/kg]
    pub cooling_energy_per_kg: EnergyPerMass,
    /// Fraction of the stored ice that survives a period's standing losses
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub storage_efficiency: Dimensionless,
    /// Maximum charge flow [kg/h]
    pub max_charge_rate: MassRate,
    /// Maximum discharge flow [kg/h]
    pub max_discharge_rate: MassRate,
    /// Tank capacity [kg of ice]
    pub capacity: Mass,
    /// Initial state of charge as a fraction of the tank capacity
    #[serde(deserialize_with = "deserialise_proportion")]
    pub initial_soc_fraction: Dimensionless,
    /// Tank investment cost per kg of ice capacity
    pub tank_specific_investment_cost: MoneyPerMass,
    /// Annual tank O&M cost as a fraction of the tank investment cost
    #[serde(deserialize_with = "deserialise_proportion")]
    pub tank_om_cost_fraction: Dimensionless,
    /// Compressor investment cost per kW of electric capacity
    pub compressor_specific_investment_cost: MoneyPerPower,
    /// Annual compressor O&M cost as a fraction of the compressor investment cost
    #[serde(deserialize_with = "deserialise_proportion")]
    pub compressor_om_cost_fraction: Dimensionless,
    /// Upper bound on the installed compressor capacity [kW]
    #[serde(default)]
    pub compressor_max_capacity: Option<Power>,
    /// Cost per kg of simultaneous charge and discharge flow
    pub simultaneity_penalty: MoneyPerMass,
}

impl TesParameters {
    /// Check that the parameters are valid
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cop", self.cop.value()),
            ("cooling_energy_per_kg", self.cooling_energy_per_kg.value()),
            ("max_charge_rate", self.max_charge_rate.value()),
            ("max_discharge_rate", self.max_discharge_rate.value()),
            ("capacity", self.capacity.value()),
            ("simultaneity_penalty", self.simultaneity_penalty.value()),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "{name} must be a finite number greater than zero"
            );
        }

        for (name, value) in [
            (
                "tank_specific_investment_cost",
                self.tank_specific_investment_cost.value(),
            ),
            (
                "compressor_specific_investment_cost",
                self.compressor_specific_investment_cost.value(),
            ),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be a non-negative finite number"
            );
        }

        if let Some(max_capacity) = self.compressor_max_capacity {
            ensure!(
                max_capacity.is_finite() && max_capacity > Power(0.0),
                "compressor_max_capacity must be a finite number greater than zero"
            );
        }

        Ok(())
    }

    /// The state of charge before the first period [kg]
    pub fn initial_soc(&self) -> Mass {
        self.initial_soc_fraction * self.capacity
    }
}

/// The decision variables of the ice thermal energy store
pub struct TesVariables {
    /// Installed compressor capacity [kW]
    pub compressor_capacity: Variable,
    /// Electricity drawn by the compressor, per period [kW]
    pub electric_input: IndexMap<Period, Variable>,
    /// Ice produced by the compressor, per period [kg/h]
    pub ice_production: IndexMap<Period, Variable>,
    /// Ice flowing into the tank, per period [kg/h]
    pub charge: IndexMap<Period, Variable>,
    /// Ice melted for cooling, per period [kg/h]
    pub discharge: IndexMap<Period, Variable>,
    /// Mass of ice in the tank at the end of each period [kg]
    pub soc: IndexMap<Period, Variable>,
    /// Simultaneous charge/discharge flow, per period [kg/h]
    pub overlap: IndexMap<Period, Variable>,
    /// Binary selector used to measure the overlap exactly
    pub overlap_mode: IndexMap<Period, Variable>,
}

/// Add the store's variables to the problem.
///
/// Flow and state bounds are column bounds: the solver can never visit an assignment with a
/// state of charge outside `[0, capacity]` or a flow above its rate limit.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `registry` - Solution-index bookkeeping for all variables
/// * `parameters` - The TES parameters
/// * `horizon` - The model's time discretisation
/// * `capacity_cost` - Objective coefficient for the compressor capacity variable
pub fn add_variables(
    problem: &mut Problem,
    registry: &mut VariableRegistry,
    parameters: &TesParameters,
    horizon: &Horizon,
    capacity_cost: f64,
) -> TesVariables {
    let compressor_capacity = match parameters.compressor_max_capacity {
        Some(max_capacity) => problem.add_column(capacity_cost, 0.0..=max_capacity.value()),
        None => problem.add_column(capacity_cost, 0.0..),
    };
    registry.track(compressor_capacity);

    // The overlap is priced per kg of overlapped flow, so its objective coefficient carries the
    // period duration
    let overlap_cost =
        parameters.simultaneity_penalty.value() * horizon.delta_time.value();

    let mut variables = TesVariables {
        compressor_capacity,
        electric_input: IndexMap::with_capacity(horizon.len()),
        ice_production: IndexMap::with_capacity(horizon.len()),
        charge: IndexMap::with_capacity(horizon.len()),
        discharge: IndexMap::with_capacity(horizon.len()),
        soc: IndexMap::with_capacity(horizon.len()),
        overlap: IndexMap::with_capacity(horizon.len()),
        overlap_mode: IndexMap::with_capacity(horizon.len()),
    };

    for period in horizon.iter() {
        variables
            .electric_input
            .insert(period, registry.track(problem.add_column(0.0, 0.0..)));
        variables
            .ice_production
            .insert(period, registry.track(problem.add_column(0.0, 0.0..)));
        variables.charge.insert(
            period,
            registry.track(problem.add_column(0.0, 0.0..=parameters.max_charge_rate.value())),
        );
        variables.discharge.insert(
            period,
            registry.track(problem.add_column(0.0, 0.0..=parameters.max_discharge_rate.value())),
        );
        variables.soc.insert(
            period,
            registry.track(problem.add_column(0.0, 0.0..=parameters.capacity.value())),
        );
        variables
            .overlap
            .insert(period, registry.track(problem.add_column(overlap_cost, 0.0..)));
        variables.overlap_mode.insert(
            period,
            registry.track(problem.add_integer_column(0.0, 0.0..=1.0)),
        );
    }

    variables
}

/// Add the store's constraints to the problem.
pub fn add_constraints(
    problem: &mut Problem,
    variables: &TesVariables,
    parameters: &TesParameters,
    horizon: &Horizon,
) {
    add_state_of_charge_constraints(problem, variables, parameters, horizon.delta_time);
    add_production_constraints(problem, variables, parameters, horizon);
    add_overlap_constraints(problem, variables, parameters, horizon);
}

/// Add the state-of-charge recursion.
///
/// The standing loss applies to the stock carried through each period, including the charge
/// arriving during it; discharge is drawn after losses:
///
/// `soc(t) = storage_efficiency * (soc(t-1) + charge(t)*dt) - discharge(t)*dt`
///
/// The first period starts from the configured initial state of charge. Discharging more than
/// the current stock is prevented by the `soc >= 0` column bound, not by an explicit
/// rate-vs-stock constraint.
fn add_state_of_charge_constraints(
    problem: &mut Problem,
    variables: &TesVariables,
    parameters: &TesParameters,
    delta_time: Hours,
) {
    let efficiency = parameters.storage_efficiency.value();
    let dt = delta_time.value();

    let first = *variables.soc.keys().next().expect("Horizon is never empty");
    let initial = efficiency * parameters.initial_soc().value();
    problem.add_row(
        initial..=initial,
        [
            (variables.soc[&first], 1.0),
            (variables.charge[&first], -efficiency * dt),
            (variables.discharge[&first], dt),
        ],
    );

    for (previous, period) in variables.soc.keys().copied().tuple_windows() {
        problem.add_row(
            0.0..=0.0,
            [
                (variables.soc[&period], 1.0),
                (variables.soc[&previous], -efficiency),
                (variables.charge[&period], -efficiency * dt),
                (variables.discharge[&period], dt),
            ],
        );
    }
}

/// Add the ice-production coupling and compressor capacity bounds.
///
/// For every period:
/// - `ice_production * cooling_energy_per_kg = cop * electric_input` (exact conversion)
/// - `electric_input <= compressor_capacity`
/// - `ice_production <= compressor_capacity * cop / cooling_energy_per_kg`, implied by the two
///   rows above but stated directly to bound ice production without going through the coupling
/// - `charge = ice_production` (no buffering between the compressor and the tank)
fn add_production_constraints(
    problem: &mut Problem,
    variables: &TesVariables,
    parameters: &TesParameters,
    horizon: &Horizon,
) {
    let cop = parameters.cop.value();
    let energy_per_kg = parameters.cooling_energy_per_kg.value();

    for period in horizon.iter() {
        let electric_input = variables.electric_input[&period];
        let ice_production = variables.ice_production[&period];

        problem.add_row(
            0.0..=0.0,
            [(ice_production, energy_per_kg), (electric_input, -cop)],
        );
        problem.add_row(
            ..=0.0,
            [(electric_input, 1.0), (variables.compressor_capacity, -1.0)],
        );
        problem.add_row(
            ..=0.0,
            [
                (ice_production, 1.0),
                (variables.compressor_capacity, -cop / energy_per_kg),
            ],
        );
        problem.add_row(
            0.0..=0.0,
            [(variables.charge[&period], 1.0), (ice_production, -1.0)],
        );
    }
}

/// Add the rows that measure simultaneous charge and discharge.
///
/// Per period, with `y` the binary selector and `M` the respective rate limits:
///
/// `overlap >= charge - M_charge * y` and `overlap >= discharge - M_discharge * (1 - y)`
///
/// Under the (positive) penalty the optimiser settles on
/// `overlap = min(charge, discharge)`: zero whenever either flow is idle, strictly positive
/// whenever both run. Simultaneous operation stays feasible; it is only priced.
fn add_overlap_constraints(
    problem: &mut Problem,
    variables: &TesVariables,
    parameters: &TesParameters,
    horizon: &Horizon,
) {
    let max_charge = parameters.max_charge_rate.value();
    let max_discharge = parameters.max_discharge_rate.value();

    for period in horizon.iter() {
        let overlap = variables.overlap[&period];
        let mode = variables.overlap_mode[&period];

        problem.add_row(
            ..=0.0,
            [
                (variables.charge[&period], 1.0),
                (overlap, -1.0),
                (mode, -max_charge),
            ],
        );
        problem.add_row(
            ..=max_discharge,
            [
                (variables.discharge[&period], 1.0),
                (overlap, -1.0),
                (mode, max_discharge),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::tes_parameters;
    use float_cmp::assert_approx_eq;
    use highs::{HighsModelStatus, Sense};
    use rstest::rstest;

    struct PinnedSolve {
        status: HighsModelStatus,
        columns: Vec<f64>,
        variables: TesVariables,
        registry: VariableRegistry,
    }

    impl PinnedSolve {
        fn value(&self, var: Variable) -> f64 {
            self.columns[self.registry.index_of(var)]
        }
    }

    /// Build a TES-only problem with charge and discharge pinned to the given profiles
    fn solve_with_pinned_flows(
        parameters: &TesParameters,
        charge: &[f64],
        discharge: &[f64],
    ) -> PinnedSolve {
        let horizon = Horizon {
            periods: charge.len() as u32,
            delta_time: Hours(1.0),
        };

        let mut problem = Problem::default();
        let mut registry = VariableRegistry::default();
        let variables = add_variables(&mut problem, &mut registry, parameters, &horizon, 0.0);
        add_constraints(&mut problem, &variables, parameters, &horizon);

        for (period, (&charge, &discharge)) in
            horizon.iter().zip(charge.iter().zip(discharge.iter()))
        {
            problem.add_row(charge..=charge, [(variables.charge[&period], 1.0)]);
            problem.add_row(discharge..=discharge, [(variables.discharge[&period], 1.0)]);
        }

        let solved = problem.optimise(Sense::Minimise).solve();
        let status = solved.status();
        let columns = match status {
            HighsModelStatus::Optimal => solved.get_solution().columns().to_vec(),
            _ => Vec::new(),
        };

        PinnedSolve {
            status,
            columns,
            variables,
            registry,
        }
    }

    #[rstest]
    fn test_state_of_charge_recursion(tes_parameters: TesParameters) {
        // Reference trajectory: eta=0.98, dt=1h, soc(0)=0
        let solve =
            solve_with_pinned_flows(&tes_parameters, &[50.0, 0.0, 0.0], &[0.0, 20.0, 10.0]);
        assert_eq!(solve.status, HighsModelStatus::Optimal);

        let expected = [49.0, 28.02, 17.4596];
        for (period, expected) in solve.variables.soc.keys().zip(expected) {
            assert_approx_eq!(
                f64,
                solve.value(solve.variables.soc[period]),
                expected,
                epsilon = 1e-6
            );
        }
    }

    #[rstest]
    fn test_state_of_charge_recursion_with_initial_stock(mut tes_parameters: TesParameters) {
        tes_parameters.initial_soc_fraction = Dimensionless(0.5); // 50 kg
        let solve = solve_with_pinned_flows(&tes_parameters, &[0.0, 0.0], &[10.0, 10.0]);
        assert_eq!(solve.status, HighsModelStatus::Optimal);

        // soc(1) = 50*0.98 - 10 = 39; soc(2) = 39*0.98 - 10 = 28.22
        let soc: Vec<_> = solve
            .variables
            .soc
            .values()
            .map(|&var| solve.value(var))
            .collect();
        assert_approx_eq!(f64, soc[0], 39.0, epsilon = 1e-6);
        assert_approx_eq!(f64, soc[1], 28.22, epsilon = 1e-6);
    }

    #[rstest]
    fn test_charge_equals_ice_production(tes_parameters: TesParameters) {
        let solve = solve_with_pinned_flows(&tes_parameters, &[30.0, 5.0], &[0.0, 0.0]);
        assert_eq!(solve.status, HighsModelStatus::Optimal);

        for period in solve.variables.charge.keys() {
            assert_approx_eq!(
                f64,
                solve.value(solve.variables.charge[period]),
                solve.value(solve.variables.ice_production[period]),
                epsilon = 1e-9
            );
        }
    }

    #[rstest]
    fn test_ice_production_coupling(mut tes_parameters: TesParameters) {
        // cop=3, 0.334 kWh/kg, 0.1 kW of electric input -> 0.3/0.334 kg/h of ice
        tes_parameters.cop = Dimensionless(3.0);
        tes_parameters.cooling_energy_per_kg = EnergyPerMass(0.334);

        let horizon = Horizon {
            periods: 1,
            delta_time: Hours(1.0),
        };
        let mut problem = Problem::default();
        let mut registry = VariableRegistry::default();
        let variables = add_variables(&mut problem, &mut registry, &tes_parameters, &horizon, 0.0);
        add_constraints(&mut problem, &variables, &tes_parameters, &horizon);

        let period = Period(1);
        problem.add_row(0.1..=0.1, [(variables.electric_input[&period], 1.0)]);

        let solved = problem.optimise(Sense::Minimise).solve();
        assert_eq!(solved.status(), HighsModelStatus::Optimal);
        let columns = solved.get_solution().columns().to_vec();

        let ice = columns[registry.index_of(variables.ice_production[&period])];
        let charge = columns[registry.index_of(variables.charge[&period])];
        assert_approx_eq!(f64, ice, 0.3 / 0.334, epsilon = 1e-6);
        assert_approx_eq!(f64, charge, ice, epsilon = 1e-9);
    }

    #[rstest]
    fn test_overflowing_charge_is_rejected(tes_parameters: TesParameters) {
        // Charging 60 kg/h for two hours into a 100 kg tank breaches the upper state-of-charge
        // bound ((0+60)*0.98 = 58.8, then (58.8+60)*0.98 = 116.4 > 100)
        let solve = solve_with_pinned_flows(&tes_parameters, &[60.0, 60.0], &[0.0, 0.0]);
        assert_ne!(solve.status, HighsModelStatus::Optimal);
    }

    #[rstest]
    fn test_overdraining_discharge_is_rejected(tes_parameters: TesParameters) {
        // Discharging an empty tank breaches the lower state-of-charge bound
        let solve = solve_with_pinned_flows(&tes_parameters, &[0.0, 0.0], &[0.0, 10.0]);
        assert_ne!(solve.status, HighsModelStatus::Optimal);
    }

    #[rstest]
    fn test_overlap_measures_simultaneous_flow(mut tes_parameters: TesParameters) {
        tes_parameters.initial_soc_fraction = Dimensionless(0.5);
        let solve = solve_with_pinned_flows(&tes_parameters, &[5.0, 5.0], &[3.0, 0.0]);
        assert_eq!(solve.status, HighsModelStatus::Optimal);

        // Both flows nonzero: overlap is their minimum. Either flow zero: no overlap.
        let overlap: Vec<_> = solve
            .variables
            .overlap
            .values()
            .map(|&var| solve.value(var))
            .collect();
        assert_approx_eq!(f64, overlap[0], 3.0, epsilon = 1e-6);
        assert_approx_eq!(f64, overlap[1], 0.0, epsilon = 1e-6);
    }

    #[rstest]
    #[case(0.0, false)] // zero penalty could not discourage anything
    #[case(-0.05, false)]
    #[case(0.05, true)]
    fn test_validate_penalty(
        mut tes_parameters: TesParameters,
        #[case] penalty: f64,
        #[case] expected_valid: bool,
    ) {
        tes_parameters.simultaneity_penalty = MoneyPerMass(penalty);
        assert_eq!(tes_parameters.validate().is_ok(), expected_valid);
    }

    #[rstest]
    #[case(100.0, true)]
    #[case(0.0, false)]
    #[case(f64::INFINITY, false)]
    fn test_validate_capacity(
        mut tes_parameters: TesParameters,
        #[case] capacity: f64,
        #[case] expected_valid: bool,
    ) {
        tes_parameters.capacity = Mass(capacity);
        assert_eq!(tes_parameters.validate().is_ok(), expected_valid);
    }
}
