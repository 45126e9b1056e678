//! The cold-room cooling subsystem.
//!
//! Cooling demand can be met by a direct electric compressor, by an ice thermal energy store
//! charged by its own compressor, or by both. Each technology is configured in its own section of
//! the model file with a mandatory `enabled` flag; whether a technology participates is decided
//! once, when the model is loaded, by building a [`CoolingSource`] for it. The dispatch layer
//! only ever sees the built sum type, so a disabled technology has no variables to reference.
use anyhow::{Context, Result};
use serde::Deserialize;

pub mod compressor;
pub mod tes;

use compressor::CompressorParameters;
use tes::TesParameters;

/// The contribution of a cooling technology, decided at model-build time.
#[derive(Debug, Clone, PartialEq)]
pub enum CoolingSource<T> {
    /// The technology is switched off: it contributes no variables, no balance terms and no costs
    Disabled,
    /// The technology participates with the given (validated) parameters
    Active(T),
}

impl<T> CoolingSource<T> {
    /// The parameters of the technology, if it is active
    pub fn as_active(&self) -> Option<&T> {
        match self {
            Self::Disabled => None,
            Self::Active(parameters) => Some(parameters),
        }
    }

    /// Whether the technology is active
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// A cooling technology section of the model file.
///
/// The `enabled` flag has no default: leaving it out of the model file is a configuration error,
/// not an implicit opt-out.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TechnologySection<T> {
    /// Whether the technology participates in the model
    pub enabled: bool,
    /// The technology's parameters (required when enabled)
    #[serde(flatten)]
    pub parameters: Option<T>,
}

/// The cooling section of the model file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoolingConfig {
    /// The direct-cooling compressor
    pub compressor: TechnologySection<CompressorParameters>,
    /// The ice thermal energy store
    pub tes: TechnologySection<TesParameters>,
}

/// The validated cooling subsystem of a model
#[derive(Debug, Clone, PartialEq)]
pub struct CoolingSystem {
    /// The direct-cooling compressor
    pub compressor: CoolingSource<CompressorParameters>,
    /// The ice thermal energy store
    pub tes: CoolingSource<TesParameters>,
}

/// Build a [`CoolingSource`] from a model-file section, validating parameters if enabled
fn build_source<T: Clone>(
    section: &TechnologySection<T>,
    name: &str,
    validate: fn(&T) -> Result<()>,
) -> Result<CoolingSource<T>> {
    if !section.enabled {
        return Ok(CoolingSource::Disabled);
    }

    let parameters = section
        .parameters
        .as_ref()
        .with_context(|| format!("{name} is enabled but its parameters are missing"))?;
    validate(parameters).with_context(|| format!("Invalid parameters for {name}"))?;

    Ok(CoolingSource::Active(parameters.clone()))
}

impl CoolingConfig {
    /// Build the validated cooling subsystem from the configuration
    pub fn build(&self) -> Result<CoolingSystem> {
        Ok(CoolingSystem {
            compressor: build_source(
                &self.compressor,
                "cooling.compressor",
                CompressorParameters::validate,
            )?,
            tes: build_source(&self.tes, "cooling.tes", TesParameters::validate)?,
        })
    }
}
