//! Code for performing the capacity-expansion and dispatch optimisation.
//!
//! The model is assembled into a single [`highs::RowProblem`]: first every decision variable is
//! created (columns, with their bounds and objective cost coefficients), then every constraint
//! group registers its rows against the variables it references. Constraint groups are
//! independent of one another, so their registration order does not matter; only the
//! variables-before-constraints order does. The problem is always solved as a minimisation of
//! total system cost.
use crate::cooling::compressor::{self, CompressorVariables};
use crate::cooling::tes::{self, TesVariables};
use crate::costs::capacity_objective_coefficient;
use crate::horizon::Period;
use crate::model::Model;
use crate::units::{Energy, Mass, MassRate, Power};
use anyhow::{Result, anyhow};
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::info;

pub mod balance;
pub mod electrical;

use balance::{add_electrical_balance_constraints, add_thermal_balance_constraints};
use electrical::ElectricalVariables;

/// A decision variable in the optimisation.
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
pub type Variable = highs::Col;

/// Keeps track of the solution-array index assigned to each variable.
///
/// Columns are indexed in creation order, so every variable must be registered here exactly once,
/// immediately after it is added to the problem.
#[derive(Default)]
pub struct VariableRegistry {
    variable_to_index: IndexMap<Variable, usize>,
}

impl VariableRegistry {
    /// Register a newly created variable, returning it for convenience
    pub fn track(&mut self, var: Variable) -> Variable {
        let index = self.variable_to_index.len();
        let existing = self.variable_to_index.insert(var, index).is_some();
        assert!(!existing, "Duplicate entry for variable");
        var
    }

    /// The solution-array index of the given variable
    pub fn index_of(&self, var: Variable) -> usize {
        self.variable_to_index[&var]
    }
}

/// All decision variables of the assembled problem.
///
/// The cooling technologies are present only when enabled: a disabled technology has no
/// variables at all, so nothing can reference it by accident.
pub struct VariableMap {
    registry: VariableRegistry,
    /// The base electrical model's variables
    pub electrical: ElectricalVariables,
    /// The direct-cooling compressor's variables, if enabled
    pub compressor: Option<CompressorVariables>,
    /// The ice store's variables, if enabled
    pub tes: Option<TesVariables>,
}

/// Add all variables to the optimisation problem.
fn add_variables(problem: &mut Problem, model: &Model) -> VariableMap {
    let mut registry = VariableRegistry::default();

    let electrical = electrical::add_variables(problem, &mut registry, model);

    let compressor = model.cooling.compressor.as_active().map(|parameters| {
        let capacity_cost = capacity_objective_coefficient(
            parameters.specific_investment_cost,
            parameters.om_cost_fraction,
        );
        compressor::add_variables(problem, &mut registry, parameters, &model.horizon, capacity_cost)
    });

    let tes = model.cooling.tes.as_active().map(|parameters| {
        let capacity_cost = capacity_objective_coefficient(
            parameters.compressor_specific_investment_cost,
            parameters.compressor_om_cost_fraction,
        );
        tes::add_variables(problem, &mut registry, parameters, &model.horizon, capacity_cost)
    });

    VariableMap {
        registry,
        electrical,
        compressor,
        tes,
    }
}

/// Add all constraints to the optimisation problem.
fn add_constraints(problem: &mut Problem, variables: &VariableMap, model: &Model) {
    electrical::add_constraints(problem, &variables.electrical, model);

    if let (Some(compressor_variables), Some(parameters)) =
        (&variables.compressor, model.cooling.compressor.as_active())
    {
        compressor::add_constraints(problem, compressor_variables, parameters, &model.horizon);
    }
    if let (Some(tes_variables), Some(parameters)) =
        (&variables.tes, model.cooling.tes.as_active())
    {
        tes::add_constraints(problem, tes_variables, parameters, &model.horizon);
    }

    add_thermal_balance_constraints(problem, variables, model);
    add_electrical_balance_constraints(problem, variables, model);
}

/// The solution to the dispatch optimisation problem
pub struct Solution {
    solution: highs::Solution,
    /// The problem's variables
    pub variables: VariableMap,
}

impl Solution {
    /// The solution value of the given variable
    pub fn value(&self, var: Variable) -> f64 {
        self.solution.columns()[self.variables.registry.index_of(var)]
    }

    /// Extract the typed results of the optimisation.
    ///
    /// Disabled cooling technologies are reported as all-zero series, which is their fixed-zero
    /// convention throughout the model.
    pub fn results(&self, model: &Model) -> Results {
        let power_series = |vars: &IndexMap<Period, Variable>| -> IndexMap<Period, Power> {
            model
                .horizon
                .iter()
                .map(|period| {
                    let value = vars.get(&period).map_or(0.0, |&var| self.value(var));
                    (period, Power(value))
                })
                .collect()
        };
        let mass_rate_series =
            |vars: Option<&IndexMap<Period, Variable>>| -> IndexMap<Period, MassRate> {
                model
                    .horizon
                    .iter()
                    .map(|period| {
                        let value = vars
                            .and_then(|vars| vars.get(&period))
                            .map_or(0.0, |&var| self.value(var));
                        (period, MassRate(value))
                    })
                    .collect()
            };

        let electrical = &self.variables.electrical;
        let pv_capacity = Power(self.value(electrical.pv_capacity));

        let compressor = self.variables.compressor.as_ref();
        let tes = self.variables.tes.as_ref();
        let empty = IndexMap::new();

        let tes_discharge = mass_rate_series(tes.map(|vars| &vars.discharge));
        let energy_per_kg = model
            .cooling
            .tes
            .as_active()
            .map_or(0.0, |parameters| parameters.cooling_energy_per_kg.value());

        Results {
            pv_capacity,
            generator_capacity: Power(self.value(electrical.generator_capacity)),
            battery_capacity: Energy(self.value(electrical.battery_capacity)),
            compressor_capacity: compressor
                .map_or(Power(0.0), |vars| Power(self.value(vars.capacity))),
            tes_compressor_capacity: tes
                .map_or(Power(0.0), |vars| Power(self.value(vars.compressor_capacity))),
            pv_output: model
                .horizon
                .iter()
                .map(|period| (period, pv_capacity * model.series.pv_yield(period)))
                .collect(),
            generator_output: power_series(&electrical.generator_output),
            grid_import: power_series(&electrical.grid_import),
            grid_export: power_series(&electrical.grid_export),
            battery_charge: power_series(&electrical.battery_charge),
            battery_discharge: power_series(&electrical.battery_discharge),
            battery_soc: model
                .horizon
                .iter()
                .map(|period| (period, Energy(self.value(electrical.battery_soc[&period]))))
                .collect(),
            compressor_cooling: power_series(
                compressor.map_or(&empty, |vars| &vars.cooling_output),
            ),
            compressor_electric: power_series(
                compressor.map_or(&empty, |vars| &vars.electric_input),
            ),
            tes_electric: power_series(tes.map_or(&empty, |vars| &vars.electric_input)),
            tes_ice_production: mass_rate_series(tes.map(|vars| &vars.ice_production)),
            tes_charge: mass_rate_series(tes.map(|vars| &vars.charge)),
            tes_cooling: tes_discharge
                .iter()
                .map(|(period, discharge)| (*period, Power(discharge.value() * energy_per_kg)))
                .collect(),
            tes_discharge,
            tes_soc: model
                .horizon
                .iter()
                .map(|period| {
                    let value = tes
                        .and_then(|vars| vars.soc.get(&period))
                        .map_or(0.0, |&var| self.value(var));
                    (period, Mass(value))
                })
                .collect(),
            tes_overlap: mass_rate_series(tes.map(|vars| &vars.overlap)),
        }
    }
}

/// The typed results of a solved model, one entry per period for the flow series
pub struct Results {
    /// Installed PV capacity [kW]
    pub pv_capacity: Power,
    /// Installed generator capacity [kW]
    pub generator_capacity: Power,
    /// Installed battery capacity [kWh]
    pub battery_capacity: Energy,
    /// Installed direct-cooling compressor capacity [kW]
    pub compressor_capacity: Power,
    /// Installed TES compressor capacity [kW]
    pub tes_compressor_capacity: Power,
    /// PV production [kW]
    pub pv_output: IndexMap<Period, Power>,
    /// Generator output [kW]
    pub generator_output: IndexMap<Period, Power>,
    /// Grid imports [kW]
    pub grid_import: IndexMap<Period, Power>,
    /// Grid exports [kW]
    pub grid_export: IndexMap<Period, Power>,
    /// Battery charging power [kW]
    pub battery_charge: IndexMap<Period, Power>,
    /// Battery discharging power [kW]
    pub battery_discharge: IndexMap<Period, Power>,
    /// Battery state of charge [kWh]
    pub battery_soc: IndexMap<Period, Energy>,
    /// Cooling delivered by the direct compressor [kW]
    pub compressor_cooling: IndexMap<Period, Power>,
    /// Electricity drawn by the direct compressor [kW]
    pub compressor_electric: IndexMap<Period, Power>,
    /// Electricity drawn by the TES compressor [kW]
    pub tes_electric: IndexMap<Period, Power>,
    /// Ice produced by the TES compressor [kg/h]
    pub tes_ice_production: IndexMap<Period, MassRate>,
    /// TES charge flow [kg/h]
    pub tes_charge: IndexMap<Period, MassRate>,
    /// TES discharge flow [kg/h]
    pub tes_discharge: IndexMap<Period, MassRate>,
    /// Cooling delivered by the TES [kW]
    pub tes_cooling: IndexMap<Period, Power>,
    /// TES state of charge [kg]
    pub tes_soc: IndexMap<Period, Mass>,
    /// Simultaneous TES charge/discharge flow [kg/h]
    pub tes_overlap: IndexMap<Period, MassRate>,
}

/// Perform the dispatch and capacity-expansion optimisation.
///
/// # Arguments
///
/// * `model` - The model
///
/// # Returns
///
/// A solution containing installed capacities and dispatched flows, or an error with the solver
/// status if no optimal solution was found.
pub fn perform_dispatch_optimisation(model: &Model) -> Result<Solution> {
    info!("Performing dispatch optimisation...");

    // Set up problem
    let mut problem = Problem::default();
    let variables = add_variables(&mut problem, model);

    // Add constraints
    add_constraints(&mut problem, &variables, model);

    let mut highs_model = problem.optimise(Sense::Minimise);
    configure_highs_logging(&mut highs_model);

    // Solve model
    let solution = highs_model.solve();
    match solution.status() {
        HighsModelStatus::Optimal => Ok(Solution {
            solution: solution.get_solution(),
            variables,
        }),
        status => Err(anyhow!("Could not solve: {status:?}")),
    }
}

/// Enable logging for the HiGHS solver.
///
/// The solver writes directly to stdout rather than through our logger, so skip it entirely when
/// logging is switched off (e.g. when running tests).
fn configure_highs_logging(model: &mut highs::Model) {
    if let Ok(log_level) = std::env::var(crate::log::LOG_LEVEL_ENV_VAR) {
        if log_level.eq_ignore_ascii_case("off") {
            return;
        }
    }

    model.set_option("log_to_console", true);
    model.set_option("output_flag", true);
}
