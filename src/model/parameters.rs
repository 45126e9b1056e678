//! Defines the [`ModelParameters`] struct, which represents the contents of `model.toml`.
use crate::cooling::CoolingConfig;
use crate::horizon::Horizon;
use crate::input::{deserialise_proportion, input_err_msg, read_toml};
use crate::technology::{BatteryParameters, GeneratorParameters, GridConfig, PvParameters};
use crate::units::Dimensionless;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// The model file name
pub const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

/// Default distribution losses when the model file leaves them out
fn default_distribution_losses() -> Dimensionless {
    Dimensionless(0.0)
}

/// The electrical section of the model file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElectricalParameters {
    /// Fraction of generated electricity lost in distribution
    #[serde(
        default = "default_distribution_losses",
        deserialize_with = "deserialise_proportion"
    )]
    pub distribution_losses: Dimensionless,
    /// The PV installation
    pub pv: PvParameters,
    /// The dispatchable generator
    pub generator: GeneratorParameters,
    /// The battery storage
    pub battery: BatteryParameters,
    /// The grid connection
    pub grid: GridConfig,
}

impl ElectricalParameters {
    /// Check that the parameters are valid
    fn validate(&self) -> Result<()> {
        self.pv
            .validate()
            .context("Invalid parameters for electrical.pv")?;
        self.generator
            .validate()
            .context("Invalid parameters for electrical.generator")?;
        self.battery
            .validate()
            .context("Invalid parameters for electrical.battery")?;

        Ok(())
    }
}

/// Represents the contents of the entire model file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelParameters {
    /// The time discretisation
    pub horizon: Horizon,
    /// The base electrical model
    pub electrical: ElectricalParameters,
    /// The cooling subsystem
    pub cooling: CoolingConfig,
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file.
    ///
    /// The grid connection and the cooling technologies are validated when they are built into
    /// their sum types, so only the scalar sections are checked here.
    fn validate(&self) -> Result<()> {
        self.horizon.validate()?;
        self.electrical.validate()?;

        Ok(())
    }
}
