//! Helpers shared between the integration tests.
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// The contents of a small but complete model file
pub const MODEL_FILE_CONTENTS: &str = r#"
[horizon]
periods = 6
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
connection = "purchase_and_sale"
max_import = 100.0
purchase_price = 0.25
max_export = 50.0
sale_price = 0.10

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
"#;

/// The contents of the matching time series file
pub const TIME_SERIES_CONTENTS: &str = "\
period,electricity_demand,cooling_demand,pv_yield,grid_availability
1,10.0,2.0,0.0,1.0
2,12.0,3.0,0.2,1.0
3,14.0,4.0,0.7,1.0
4,11.0,3.5,0.9,1.0
5,9.0,2.0,0.4,1.0
6,8.0,1.5,0.0,1.0
";

/// Write a complete model directory to `dir`
pub fn write_model_dir(dir: &Path) {
    let mut file = File::create(dir.join("model.toml")).unwrap();
    writeln!(file, "{MODEL_FILE_CONTENTS}").unwrap();

    let mut file = File::create(dir.join("time_series.csv")).unwrap();
    write!(file, "{TIME_SERIES_CONTENTS}").unwrap();
}
