//! The direct-cooling compressor.
//!
//! A vapour-compression unit serving the cold room directly: its cooling output is a fixed
//! multiple (the COP) of its electric draw, and is limited in every period by the installed
//! capacity chosen by the optimisation.
use crate::dispatch::{Variable, VariableRegistry};
use crate::horizon::{Horizon, Period};
use crate::input::deserialise_proportion;
use crate::units::{Dimensionless, MoneyPerPower, Power};
use anyhow::{Result, ensure};
use highs::RowProblem as Problem;
use indexmap::IndexMap;
use serde::Deserialize;

/// Parameters for the direct-cooling compressor
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompressorParameters {
    /// Coefficient of performance: cooling output per unit of electric input
    pub cop: Dimensionless,
    /// Investment cost per kW of cooling capacity
    pub specific_investment_cost: MoneyPerPower,
    /// Annual O&M cost as a fraction of the investment cost
    #[serde(deserialize_with = "deserialise_proportion")]
    pub om_cost_fraction: Dimensionless,
    /// Upper bound on the installed cooling capacity [kW]
    #[serde(default)]
    pub max_capacity: Option<Power>,
}

impl CompressorParameters {
    /// Check that the parameters are valid
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.cop.is_finite() && self.cop > Dimensionless(0.0),
            "cop must be a finite number greater than zero"
        );
        ensure!(
            self.specific_investment_cost.is_finite()
                && self.specific_investment_cost >= MoneyPerPower(0.0),
            "specific_investment_cost must be a non-negative finite number"
        );
        if let Some(max_capacity) = self.max_capacity {
            ensure!(
                max_capacity.is_finite() && max_capacity > Power(0.0),
                "max_capacity must be a finite number greater than zero"
            );
        }

        Ok(())
    }
}

/// The decision variables of the direct-cooling compressor
pub struct CompressorVariables {
    /// Installed cooling capacity [kW]
    pub capacity: Variable,
    /// Cooling delivered to the cold room, per period [kW]
    pub cooling_output: IndexMap<Period, Variable>,
    /// Electricity drawn from the busbar, per period [kW]
    pub electric_input: IndexMap<Period, Variable>,
}

/// Add the compressor's variables to the problem.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `registry` - Solution-index bookkeeping for all variables
/// * `parameters` - The compressor parameters
/// * `horizon` - The model's time discretisation
/// * `capacity_cost` - Objective coefficient for the capacity variable
pub fn add_variables(
    problem: &mut Problem,
    registry: &mut VariableRegistry,
    parameters: &CompressorParameters,
    horizon: &Horizon,
    capacity_cost: f64,
) -> CompressorVariables {
    let capacity = match parameters.max_capacity {
        Some(max_capacity) => problem.add_column(capacity_cost, 0.0..=max_capacity.value()),
        None => problem.add_column(capacity_cost, 0.0..),
    };
    registry.track(capacity);

    let mut cooling_output = IndexMap::with_capacity(horizon.len());
    let mut electric_input = IndexMap::with_capacity(horizon.len());
    for period in horizon.iter() {
        cooling_output.insert(period, registry.track(problem.add_column(0.0, 0.0..)));
        electric_input.insert(period, registry.track(problem.add_column(0.0, 0.0..)));
    }

    CompressorVariables {
        capacity,
        cooling_output,
        electric_input,
    }
}

/// Add the compressor's constraints to the problem.
///
/// For every period:
/// - the COP identity `cooling_output = cop * electric_input`
/// - the capacity bound `cooling_output <= capacity`
pub fn add_constraints(
    problem: &mut Problem,
    variables: &CompressorVariables,
    parameters: &CompressorParameters,
    horizon: &Horizon,
) {
    for period in horizon.iter() {
        let cooling_output = variables.cooling_output[&period];
        let electric_input = variables.electric_input[&period];

        problem.add_row(
            0.0..=0.0,
            [
                (cooling_output, 1.0),
                (electric_input, -parameters.cop.value()),
            ],
        );
        problem.add_row(..=0.0, [(cooling_output, 1.0), (variables.capacity, -1.0)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{compressor_parameters, horizon};
    use float_cmp::assert_approx_eq;
    use highs::{HighsModelStatus, Sense};
    use rstest::rstest;

    /// Build a compressor-only problem with the electric input pinned in every period
    fn solve_with_pinned_input(
        parameters: &CompressorParameters,
        horizon: &Horizon,
        electric_input: f64,
    ) -> (
        HighsModelStatus,
        Vec<f64>,
        CompressorVariables,
        VariableRegistry,
    ) {
        let mut problem = Problem::default();
        let mut registry = VariableRegistry::default();
        let variables = add_variables(&mut problem, &mut registry, parameters, horizon, 1.0);
        add_constraints(&mut problem, &variables, parameters, horizon);

        for period in horizon.iter() {
            problem.add_row(
                electric_input..=electric_input,
                [(variables.electric_input[&period], 1.0)],
            );
        }

        let solved = problem.optimise(Sense::Minimise).solve();
        let status = solved.status();
        let columns = match status {
            HighsModelStatus::Optimal => solved.get_solution().columns().to_vec(),
            _ => Vec::new(),
        };
        (status, columns, variables, registry)
    }

    #[rstest]
    fn test_cop_identity(compressor_parameters: CompressorParameters, horizon: Horizon) {
        let (status, columns, variables, registry) =
            solve_with_pinned_input(&compressor_parameters, &horizon, 2.0);
        assert_eq!(status, HighsModelStatus::Optimal);

        // cooling_output = cop * electric_input in every period
        for period in horizon.iter() {
            let index = registry.index_of(variables.cooling_output[&period]);
            assert_approx_eq!(
                f64,
                columns[index],
                compressor_parameters.cop.value() * 2.0,
                epsilon = 1e-6
            );
        }
    }

    #[rstest]
    fn test_capacity_bound_rejects_excess_output(
        mut compressor_parameters: CompressorParameters,
        horizon: Horizon,
    ) {
        // A pinned electric input of 2 kW at COP 3 needs 6 kW of cooling capacity; an upper
        // bound below that must make the problem infeasible
        compressor_parameters.max_capacity = Some(Power(5.0));
        let (status, ..) = solve_with_pinned_input(&compressor_parameters, &horizon, 2.0);
        assert_ne!(status, HighsModelStatus::Optimal);
    }

    #[rstest]
    #[case(3.0, true)]
    #[case(0.0, false)]
    #[case(-3.0, false)]
    #[case(f64::NAN, false)]
    fn test_validate_cop(
        mut compressor_parameters: CompressorParameters,
        #[case] cop: f64,
        #[case] expected_valid: bool,
    ) {
        compressor_parameters.cop = Dimensionless(cop);
        assert_eq!(compressor_parameters.validate().is_ok(), expected_valid);
    }
}
