//! Common routines for handling input data.
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

/// Format an error message to include the file path.
///
/// Used with [`anyhow::Context`] when passing errors up the call stack.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Parse a TOML file at the specified path.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))
}

/// Read a series of type `T`s from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: T = result.with_context(|| input_err_msg(file_path))?;
        rows.push(row);
    }

    ensure!(!rows.is_empty(), "CSV file {} is empty", file_path.display());

    Ok(rows)
}

/// Read a [`Dimensionless`], checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1 inclusive"))?
    }

    Ok(Dimensionless(value))
}

/// Read a [`Dimensionless`], checking that it is between 0 and 1, exclusive of zero
pub fn deserialise_proportion_nonzero<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) || value == 0.0 {
        Err(serde::de::Error::custom("Value must be >0 and <=1"))?
    }

    Ok(Dimensionless(value))
}
