//! Code for working with the model's time series inputs.
//!
//! A model provides one row per period with the electrical demand, the cold-room cooling demand,
//! the per-unit PV yield and the grid availability. All series must cover the whole horizon.
use crate::horizon::{Horizon, Period};
use crate::input::{deserialise_proportion, input_err_msg, read_csv};
use crate::units::{Dimensionless, Power};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

/// The file name for time series input
const TIME_SERIES_FILE_NAME: &str = "time_series.csv";

/// Represents a single row of the time series file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct TimeSeriesRow {
    /// The period this row refers to (1-based, in order)
    period: u32,
    /// Electrical demand of the village [kW]
    electricity_demand: Power,
    /// Cooling demand of the cold room [kW]
    cooling_demand: Power,
    /// PV production per unit of installed capacity [kW/kW]
    pv_yield: Dimensionless,
    /// Fraction of the period for which the grid connection is available
    #[serde(deserialize_with = "deserialise_proportion")]
    grid_availability: Dimensionless,
}

/// The time series inputs for a model, one entry per period.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    electricity_demand: Vec<Power>,
    cooling_demand: Vec<Power>,
    pv_yield: Vec<Dimensionless>,
    grid_availability: Vec<Dimensionless>,
}

impl TimeSeries {
    /// Create a time series collection from per-period columns.
    ///
    /// All columns must have one entry per period of the horizon.
    pub fn new(
        horizon: &Horizon,
        electricity_demand: Vec<Power>,
        cooling_demand: Vec<Power>,
        pv_yield: Vec<Dimensionless>,
        grid_availability: Vec<Dimensionless>,
    ) -> Result<Self> {
        for (name, len) in [
            ("electricity_demand", electricity_demand.len()),
            ("cooling_demand", cooling_demand.len()),
            ("pv_yield", pv_yield.len()),
            ("grid_availability", grid_availability.len()),
        ] {
            ensure!(
                len == horizon.len(),
                "{name} covers {len} periods but the horizon has {}",
                horizon.periods
            );
        }

        Ok(Self {
            electricity_demand,
            cooling_demand,
            pv_yield,
            grid_availability,
        })
    }

    /// Electrical demand for the given period
    pub fn electricity_demand(&self, period: Period) -> Power {
        self.electricity_demand[period.0 as usize - 1]
    }

    /// Cooling demand for the given period
    pub fn cooling_demand(&self, period: Period) -> Power {
        self.cooling_demand[period.0 as usize - 1]
    }

    /// PV yield per unit of installed capacity for the given period
    pub fn pv_yield(&self, period: Period) -> Dimensionless {
        self.pv_yield[period.0 as usize - 1]
    }

    /// Grid availability for the given period
    pub fn grid_availability(&self, period: Period) -> Dimensionless {
        self.grid_availability[period.0 as usize - 1]
    }

    /// Whether any period has a nonzero cooling demand
    pub fn has_cooling_demand(&self) -> bool {
        self.cooling_demand.iter().any(|&demand| demand > Power(0.0))
    }
}

/// Read time series data from an iterator, checking it against the horizon.
fn read_time_series_from_iter<I>(iter: I, horizon: &Horizon) -> Result<TimeSeries>
where
    I: Iterator<Item = TimeSeriesRow>,
{
    let mut series = TimeSeries {
        electricity_demand: Vec::with_capacity(horizon.len()),
        cooling_demand: Vec::with_capacity(horizon.len()),
        pv_yield: Vec::with_capacity(horizon.len()),
        grid_availability: Vec::with_capacity(horizon.len()),
    };

    let mut expected = horizon.iter();
    for row in iter {
        let period = expected
            .next()
            .context("More rows than periods in the horizon")?;
        ensure!(
            row.period == period.0,
            "Expected period {period}, found {}: periods must be numbered 1..={} in order",
            row.period,
            horizon.periods
        );

        for (name, value) in [
            ("electricity_demand", row.electricity_demand.value()),
            ("cooling_demand", row.cooling_demand.value()),
            ("pv_yield", row.pv_yield.value()),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be non-negative and finite (period {period})"
            );
        }

        series.electricity_demand.push(row.electricity_demand);
        series.cooling_demand.push(row.cooling_demand);
        series.pv_yield.push(row.pv_yield);
        series.grid_availability.push(row.grid_availability);
    }

    ensure!(
        series.electricity_demand.len() == horizon.len(),
        "Time series covers {} periods but the horizon has {}",
        series.electricity_demand.len(),
        horizon.periods
    );

    Ok(series)
}

/// Read the time series file from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `horizon` - The model's time discretisation
pub fn read_time_series(model_dir: &Path, horizon: &Horizon) -> Result<TimeSeries> {
    let file_path = model_dir.join(TIME_SERIES_FILE_NAME);
    let rows: Vec<TimeSeriesRow> = read_csv(&file_path)?;
    read_time_series_from_iter(rows.into_iter(), horizon).with_context(|| input_err_msg(&file_path))
}
