//! Code for loading and representing a whole model.
//!
//! A model directory contains `model.toml` (horizon, technology parameters, cooling
//! configuration) and `time_series.csv` (per-period demand, yield and availability data). All
//! validation happens here, before any optimisation problem is assembled: a model that loads is
//! a model that can be built.
use crate::cooling::CoolingSystem;
use crate::series::{TimeSeries, read_time_series};
use crate::technology::GridConnection;
use anyhow::{Context, Result};
use std::path::Path;

pub mod parameters;
use crate::horizon::Horizon;
use parameters::{ElectricalParameters, ModelParameters};

/// Model definition
pub struct Model {
    /// The time discretisation
    pub horizon: Horizon,
    /// The base electrical model's parameters
    pub electrical: ElectricalParameters,
    /// The validated grid connection
    pub grid: GridConnection,
    /// The validated cooling subsystem
    pub cooling: CoolingSystem,
    /// The per-period input series
    pub series: TimeSeries,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let parameters = ModelParameters::from_path(model_dir.as_ref())?;
        let grid = parameters
            .electrical
            .grid
            .build()
            .context("Invalid parameters for electrical.grid")?;
        let cooling = parameters.cooling.build()?;
        let series = read_time_series(model_dir.as_ref(), &parameters.horizon)?;

        Ok(Model {
            horizon: parameters.horizon,
            electrical: parameters.electrical,
            grid,
            cooling,
            series,
        })
    }
}
