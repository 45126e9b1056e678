//! Fixtures for tests
use crate::cooling::compressor::CompressorParameters;
use crate::cooling::tes::TesParameters;
use crate::cooling::{CoolingSource, CoolingSystem};
use crate::horizon::Horizon;
use crate::model::Model;
use crate::model::parameters::ElectricalParameters;
use crate::series::TimeSeries;
use crate::technology::{
    BatteryParameters, ConnectionType, GeneratorParameters, GridConfig, GridConnection,
    PvParameters,
};
use crate::units::{
    Dimensionless, Energy, EnergyPerMass, Hours, Mass, MassRate, MoneyPerEnergy, MoneyPerMass,
    MoneyPerPower, Power,
};
use rstest::fixture;

/// The contents of a small but complete model file
pub fn model_file_contents() -> &'static str {
    r#"
[horizon]
periods = 4
delta_time = 1.0

[electrical]
distribution_losses = 0.05

[electrical.pv]
specific_investment_cost = 900.0
om_cost_fraction = 0.02
max_capacity = 200.0

[electrical.generator]
specific_investment_cost = 700.0
om_cost_fraction = 0.02
fuel_cost = 0.35
max_capacity = 100.0

[electrical.battery]
specific_investment_cost = 400.0
om_cost_fraction = 0.01
charge_efficiency = 0.95
discharge_efficiency = 0.95
rate_limit = 0.5
max_capacity = 500.0

[electrical.grid]
connection = "purchase_only"
max_import = 100.0
purchase_price = 0.25

[cooling.compressor]
enabled = true
cop = 3.0
specific_investment_cost = 600.0
om_cost_fraction = 0.02
max_capacity = 50.0

[cooling.tes]
enabled = true
cop = 3.0
cooling_energy_per_kg = 0.334
storage_efficiency = 0.98
max_charge_rate = 80.0
max_discharge_rate = 80.0
capacity = 100.0
initial_soc_fraction = 0.0
tank_specific_investment_cost = 15.0
tank_om_cost_fraction = 0.01
compressor_specific_investment_cost = 650.0
compressor_om_cost_fraction = 0.02
compressor_max_capacity = 80.0
simultaneity_penalty = 0.05
"#
}

#[fixture]
pub fn horizon() -> Horizon {
    Horizon {
        periods: 3,
        delta_time: Hours(1.0),
    }
}

#[fixture]
pub fn compressor_parameters() -> CompressorParameters {
    CompressorParameters {
        cop: Dimensionless(3.0),
        specific_investment_cost: MoneyPerPower(600.0),
        om_cost_fraction: Dimensionless(0.02),
        max_capacity: None,
    }
}

#[fixture]
pub fn tes_parameters() -> TesParameters {
    TesParameters {
        cop: Dimensionless(3.0),
        cooling_energy_per_kg: EnergyPerMass(0.334),
        storage_efficiency: Dimensionless(0.98),
        max_charge_rate: MassRate(80.0),
        max_discharge_rate: MassRate(80.0),
        capacity: Mass(100.0),
        initial_soc_fraction: Dimensionless(0.0),
        tank_specific_investment_cost: MoneyPerMass(15.0),
        tank_om_cost_fraction: Dimensionless(0.01),
        compressor_specific_investment_cost: MoneyPerPower(650.0),
        compressor_om_cost_fraction: Dimensionless(0.02),
        compressor_max_capacity: Some(Power(80.0)),
        simultaneity_penalty: MoneyPerMass(0.05),
    }
}

#[fixture]
pub fn model(
    compressor_parameters: CompressorParameters,
    tes_parameters: TesParameters,
) -> Model {
    let horizon = Horizon {
        periods: 4,
        delta_time: Hours(1.0),
    };
    let series = TimeSeries::new(
        &horizon,
        vec![Power(10.0), Power(12.0), Power(8.0), Power(9.0)],
        vec![Power(2.0), Power(3.0), Power(2.0), Power(1.0)],
        vec![
            Dimensionless(0.0),
            Dimensionless(0.6),
            Dimensionless(0.8),
            Dimensionless(0.2),
        ],
        vec![
            Dimensionless(1.0),
            Dimensionless(1.0),
            Dimensionless(1.0),
            Dimensionless(1.0),
        ],
    )
    .unwrap();

    Model {
        horizon,
        electrical: ElectricalParameters {
            distribution_losses: Dimensionless(0.05),
            pv: PvParameters {
                specific_investment_cost: MoneyPerPower(900.0),
                om_cost_fraction: Dimensionless(0.02),
                max_capacity: Some(Power(200.0)),
            },
            generator: GeneratorParameters {
                specific_investment_cost: MoneyPerPower(700.0),
                om_cost_fraction: Dimensionless(0.02),
                fuel_cost: MoneyPerEnergy(0.35),
                max_capacity: Some(Power(100.0)),
            },
            battery: BatteryParameters {
                specific_investment_cost: MoneyPerEnergy(400.0),
                om_cost_fraction: Dimensionless(0.01),
                charge_efficiency: Dimensionless(0.95),
                discharge_efficiency: Dimensionless(0.95),
                rate_limit: Dimensionless(0.5),
                max_capacity: Some(Energy(500.0)),
            },
            grid: GridConfig {
                connection: ConnectionType::PurchaseOnly,
                max_import: Some(Power(100.0)),
                purchase_price: Some(MoneyPerEnergy(0.25)),
                max_export: None,
                sale_price: None,
            },
        },
        grid: GridConnection::Purchase {
            max_import: Power(100.0),
            purchase_price: MoneyPerEnergy(0.25),
        },
        cooling: CoolingSystem {
            compressor: CoolingSource::Active(compressor_parameters),
            tes: CoolingSource::Active(tes_parameters),
        },
        series,
    }
}
