//! End-to-end tests for loading and solving a model through the public API.
use float_cmp::assert_approx_eq;
use icegrid::costs::CostBreakdown;
use icegrid::dispatch::perform_dispatch_optimisation;
use icegrid::model::Model;
use tempfile::tempdir;

mod common;

#[test]
fn test_load_and_solve_model() {
    let dir = tempdir().unwrap();
    common::write_model_dir(dir.path());

    let model = Model::from_path(dir.path()).unwrap();
    let solution = perform_dispatch_optimisation(&model).unwrap();
    let results = solution.results(&model);

    // The thermal balance holds in every period
    for period in model.horizon.iter() {
        let cooling_supply =
            results.compressor_cooling[&period].value() + results.tes_cooling[&period].value();
        assert!(cooling_supply >= model.series.cooling_demand(period).value() - 1e-6);
    }

    // The electrical balance holds exactly in every period
    let loss = model.electrical.distribution_losses.value();
    let discharge_efficiency = model.electrical.battery.discharge_efficiency.value();
    for period in model.horizon.iter() {
        let supply = (1.0 - loss)
            * (results.pv_output[&period].value()
                + results.generator_output[&period].value()
                + results.grid_import[&period].value())
            + discharge_efficiency * results.battery_discharge[&period].value()
            - results.battery_charge[&period].value()
            - results.grid_export[&period].value();
        let demand = model.series.electricity_demand(period).value()
            + results.compressor_electric[&period].value()
            + results.tes_electric[&period].value();
        assert_approx_eq!(f64, supply, demand, epsilon = 1e-6);
    }

    // The production-charge identity and state bounds hold
    let tes = model.cooling.tes.as_active().unwrap();
    for period in model.horizon.iter() {
        assert_approx_eq!(
            f64,
            results.tes_charge[&period].value(),
            results.tes_ice_production[&period].value(),
            epsilon = 1e-6
        );
        let soc = results.tes_soc[&period].value();
        assert!(soc >= -1e-6 && soc <= tes.capacity.value() + 1e-6);
    }

    // Capacity bounds are respected
    assert!(results.pv_capacity.value() <= 200.0 + 1e-6);
    assert!(results.compressor_capacity.value() <= 50.0 + 1e-6);
    assert!(results.tes_compressor_capacity.value() <= 80.0 + 1e-6);
}

#[test]
fn test_cost_breakdown_consistency() {
    let dir = tempdir().unwrap();
    common::write_model_dir(dir.path());

    let model = Model::from_path(dir.path()).unwrap();
    let solution = perform_dispatch_optimisation(&model).unwrap();
    let results = solution.results(&model);
    let costs = CostBreakdown::calculate(&model, &results);

    // Investment costs are the capacities priced at their specific costs
    assert_approx_eq!(
        f64,
        costs.pv_investment.value(),
        results.pv_capacity.value() * 900.0,
        epsilon = 1e-6
    );
    assert_approx_eq!(
        f64,
        costs.compressor_investment.value(),
        results.compressor_capacity.value() * 600.0,
        epsilon = 1e-6
    );

    // O&M is the configured fraction of investment
    assert_approx_eq!(
        f64,
        costs.pv_om.value(),
        costs.pv_investment.value() * 0.02,
        epsilon = 1e-6
    );

    // The tank is a parameter, so its cost is a constant
    assert_approx_eq!(f64, costs.tes_tank_investment.value(), 100.0 * 15.0);

    // The total is the sum of its parts, net of sales revenue
    let expected_total = costs.pv_investment.value()
        + costs.pv_om.value()
        + costs.generator_investment.value()
        + costs.generator_om.value()
        + costs.battery_investment.value()
        + costs.battery_om.value()
        + costs.compressor_investment.value()
        + costs.compressor_om.value()
        + costs.tes_compressor_investment.value()
        + costs.tes_compressor_om.value()
        + costs.tes_tank_investment.value()
        + costs.tes_tank_om.value()
        + costs.generator_fuel.value()
        + costs.grid_purchases.value()
        + costs.simultaneity_penalty.value()
        - costs.grid_sales.value();
    assert_approx_eq!(f64, costs.total().value(), expected_total, epsilon = 1e-9);
}
