//! The module responsible for writing output data to disk.
use crate::costs::CostBreakdown;
use crate::dispatch::Results;
use crate::model::Model;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;
use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "icegrid_results";

/// The output file name for installed capacities
const CAPACITIES_FILE_NAME: &str = "capacities.csv";

/// The output file name for the electrical dispatch
const DISPATCH_FILE_NAME: &str = "dispatch.csv";

/// The output file name for the cooling subsystem
const COOLING_FILE_NAME: &str = "cooling.csv";

/// The output file name for the cost breakdown
const COSTS_FILE_NAME: &str = "costs.csv";

/// Get the default output folder for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for a model run.
///
/// # Returns
///
/// Whether an existing output directory was replaced.
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    let existed = output_dir.is_dir();
    if existed {
        ensure!(
            overwrite,
            "Output directory {} already exists (pass --overwrite to replace it)",
            output_dir.display()
        );
        fs::remove_dir_all(output_dir)?;
    }

    fs::create_dir_all(output_dir)?;

    Ok(existed)
}

/// Represents a row in the capacities CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CapacityRow {
    technology: String,
    capacity: f64,
    unit: String,
}

/// Represents a row in the dispatch CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DispatchRow {
    period: u32,
    electricity_demand: f64,
    pv_output: f64,
    generator_output: f64,
    grid_import: f64,
    grid_export: f64,
    battery_charge: f64,
    battery_discharge: f64,
    battery_soc: f64,
}

/// Represents a row in the cooling CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CoolingRow {
    period: u32,
    cooling_demand: f64,
    compressor_cooling: f64,
    compressor_electric: f64,
    tes_cooling: f64,
    tes_charge: f64,
    tes_discharge: f64,
    tes_ice_production: f64,
    tes_electric: f64,
    tes_soc: f64,
    tes_overlap: f64,
}

/// Represents a row in the costs CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CostRow {
    item: String,
    value: f64,
}

/// Write the installed capacities to a CSV file
fn write_capacities_file(output_path: &Path, results: &Results) -> Result<()> {
    let file_path = output_path.join(CAPACITIES_FILE_NAME);
    let mut writer = csv::Writer::from_path(file_path)?;

    for (technology, capacity, unit) in [
        ("pv", results.pv_capacity.value(), "kW"),
        ("generator", results.generator_capacity.value(), "kW"),
        ("battery", results.battery_capacity.value(), "kWh"),
        ("compressor", results.compressor_capacity.value(), "kW"),
        (
            "tes_compressor",
            results.tes_compressor_capacity.value(),
            "kW",
        ),
    ] {
        writer.serialize(CapacityRow {
            technology: technology.into(),
            capacity,
            unit: unit.into(),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the electrical dispatch to a CSV file
fn write_dispatch_file(output_path: &Path, model: &Model, results: &Results) -> Result<()> {
    let file_path = output_path.join(DISPATCH_FILE_NAME);
    let mut writer = csv::Writer::from_path(file_path)?;

    for period in model.horizon.iter() {
        writer.serialize(DispatchRow {
            period: period.0,
            electricity_demand: model.series.electricity_demand(period).value(),
            pv_output: results.pv_output[&period].value(),
            generator_output: results.generator_output[&period].value(),
            grid_import: results.grid_import[&period].value(),
            grid_export: results.grid_export[&period].value(),
            battery_charge: results.battery_charge[&period].value(),
            battery_discharge: results.battery_discharge[&period].value(),
            battery_soc: results.battery_soc[&period].value(),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the cooling subsystem's flows and state to a CSV file
fn write_cooling_file(output_path: &Path, model: &Model, results: &Results) -> Result<()> {
    let file_path = output_path.join(COOLING_FILE_NAME);
    let mut writer = csv::Writer::from_path(file_path)?;

    for period in model.horizon.iter() {
        writer.serialize(CoolingRow {
            period: period.0,
            cooling_demand: model.series.cooling_demand(period).value(),
            compressor_cooling: results.compressor_cooling[&period].value(),
            compressor_electric: results.compressor_electric[&period].value(),
            tes_cooling: results.tes_cooling[&period].value(),
            tes_charge: results.tes_charge[&period].value(),
            tes_discharge: results.tes_discharge[&period].value(),
            tes_ice_production: results.tes_ice_production[&period].value(),
            tes_electric: results.tes_electric[&period].value(),
            tes_soc: results.tes_soc[&period].value(),
            tes_overlap: results.tes_overlap[&period].value(),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the cost breakdown to a CSV file
fn write_costs_file(output_path: &Path, costs: &CostBreakdown) -> Result<()> {
    let file_path = output_path.join(COSTS_FILE_NAME);
    let mut writer = csv::Writer::from_path(file_path)?;

    for (item, value) in [
        ("pv_investment", costs.pv_investment),
        ("pv_om", costs.pv_om),
        ("generator_investment", costs.generator_investment),
        ("generator_om", costs.generator_om),
        ("battery_investment", costs.battery_investment),
        ("battery_om", costs.battery_om),
        ("compressor_investment", costs.compressor_investment),
        ("compressor_om", costs.compressor_om),
        ("tes_compressor_investment", costs.tes_compressor_investment),
        ("tes_compressor_om", costs.tes_compressor_om),
        ("tes_tank_investment", costs.tes_tank_investment),
        ("tes_tank_om", costs.tes_tank_om),
        ("generator_fuel", costs.generator_fuel),
        ("grid_purchases", costs.grid_purchases),
        ("grid_sales", costs.grid_sales),
        ("simultaneity_penalty", costs.simultaneity_penalty),
        ("total", costs.total()),
    ] {
        writer.serialize(CostRow {
            item: item.into(),
            value: value.value(),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write all output files for a model run.
///
/// # Arguments
///
/// * `output_path` - The output folder
/// * `model_path` - The folder containing the model which was run
/// * `model` - The model
/// * `results` - The results of the optimisation
/// * `costs` - The cost breakdown for the solution
pub fn write_output(
    output_path: &Path,
    model_path: &Path,
    model: &Model,
    results: &Results,
    costs: &CostBreakdown,
) -> Result<()> {
    write_capacities_file(output_path, results)?;
    write_dispatch_file(output_path, model, results)?;
    write_cooling_file(output_path, model, results)?;
    write_costs_file(output_path, costs)?;
    write_metadata(output_path, model_path)?;

    Ok(())
}
