//! Code for working with the planning horizon.
//!
//! The horizon discretises time into an ordered sequence of periods of fixed duration. Every
//! per-period variable and constraint in the optimisation is indexed by [`Period`].
use crate::units::Hours;
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A single period of the planning horizon.
///
/// Periods are numbered from 1, matching the `period` column of the time series file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period(pub u32);

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The time discretisation of the model.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Horizon {
    /// Number of periods in the horizon
    pub periods: u32,
    /// Duration of each period in hours
    pub delta_time: Hours,
}

impl Horizon {
    /// Check that the horizon parameters are valid
    pub fn validate(&self) -> Result<()> {
        ensure!(self.periods > 0, "horizon.periods cannot be zero");
        ensure!(
            self.delta_time.is_finite() && self.delta_time > Hours(0.0),
            "horizon.delta_time must be a finite number greater than zero"
        );

        Ok(())
    }

    /// Iterate over the periods of the horizon in order
    pub fn iter(&self) -> impl Iterator<Item = Period> + use<> {
        (1..=self.periods).map(Period)
    }

    /// The number of periods in the horizon
    pub fn len(&self) -> usize {
        self.periods as usize
    }

    /// Whether the horizon contains no periods
    pub fn is_empty(&self) -> bool {
        self.periods == 0
    }
}
