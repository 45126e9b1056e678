//! Common functionality for icegrid.
//!
//! icegrid sizes and dispatches a village microgrid with a cold-storage room: PV, a
//! dispatchable generator, battery storage and an optional grid connection on the electrical
//! side, and a direct compressor and/or an ice thermal energy store on the cooling side. The
//! whole model is assembled as a single mixed-integer/linear problem and solved with HiGHS.
#![warn(missing_docs)]
pub mod cli;
pub mod cooling;
pub mod costs;
pub mod dispatch;
pub mod horizon;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod series;
pub mod settings;
pub mod technology;
pub mod units;

#[cfg(test)]
mod fixture;
