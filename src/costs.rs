//! Cost terms for the optimisation and the post-solve cost breakdown.
//!
//! Investment and O&M costs are linear in installed capacity; operating costs are linear in the
//! dispatched flows; the simultaneity penalty is linear in the measured charge/discharge
//! overlap. Variable-dependent terms enter the objective as column cost coefficients, so this
//! module also provides the per-unit coefficient used when capacity variables are created. The
//! breakdown recomputes every term from the solution values, which is also how the (constant)
//! TES tank cost is accounted for.
use crate::cooling::CoolingSource;
use crate::dispatch::Results;
use crate::model::Model;
use crate::technology::GridConnection;
use crate::units::{Dimensionless, Money};
use serde::Serialize;
use std::ops::Mul;

/// The investment cost of a technology: installed capacity times specific cost.
pub fn investment_cost<Capacity, SpecificCost>(
    capacity: Capacity,
    specific_cost: SpecificCost,
) -> Money
where
    SpecificCost: Mul<Capacity, Output = Money>,
{
    specific_cost * capacity
}

/// The O&M cost of a technology: a fixed fraction of its investment cost.
pub fn om_cost(investment: Money, om_cost_fraction: Dimensionless) -> Money {
    om_cost_fraction * investment
}

/// The objective coefficient for a capacity variable: specific investment cost plus the O&M
/// fraction thereof, per unit of capacity.
pub fn capacity_objective_coefficient<SpecificCost>(
    specific_cost: SpecificCost,
    om_cost_fraction: Dimensionless,
) -> f64
where
    SpecificCost: Mul<Dimensionless, Output = SpecificCost> + IntoValue + Copy,
{
    (specific_cost * (Dimensionless(1.0) + om_cost_fraction)).into_value()
}

/// Helper trait so [`capacity_objective_coefficient`] can accept any specific-cost unit type
pub trait IntoValue {
    /// The raw value of the quantity
    fn into_value(self) -> f64;
}

macro_rules! impl_into_value {
    ($($t:ty),*) => {
        $(impl IntoValue for $t {
            fn into_value(self) -> f64 {
                self.value()
            }
        })*
    };
}

impl_into_value!(
    crate::units::MoneyPerPower,
    crate::units::MoneyPerEnergy,
    crate::units::MoneyPerMass
);

/// The cost breakdown of a solved model.
///
/// Every term is recomputed from the solution values; their sum (net of grid sales revenue) is
/// the value the objective minimised, plus the constant TES tank cost which the objective cannot
/// see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// PV investment cost
    pub pv_investment: Money,
    /// PV O&M cost
    pub pv_om: Money,
    /// Generator investment cost
    pub generator_investment: Money,
    /// Generator O&M cost
    pub generator_om: Money,
    /// Battery investment cost
    pub battery_investment: Money,
    /// Battery O&M cost
    pub battery_om: Money,
    /// Direct-cooling compressor investment cost
    pub compressor_investment: Money,
    /// Direct-cooling compressor O&M cost
    pub compressor_om: Money,
    /// TES compressor investment cost
    pub tes_compressor_investment: Money,
    /// TES compressor O&M cost
    pub tes_compressor_om: Money,
    /// TES tank investment cost (the tank size is a parameter, so this term is constant)
    pub tes_tank_investment: Money,
    /// TES tank O&M cost
    pub tes_tank_om: Money,
    /// Generator fuel cost over the horizon
    pub generator_fuel: Money,
    /// Cost of electricity purchased from the grid
    pub grid_purchases: Money,
    /// Revenue from electricity sold to the grid
    pub grid_sales: Money,
    /// Penalty for simultaneous TES charge and discharge
    pub simultaneity_penalty: Money,
}

impl CostBreakdown {
    /// Calculate the cost breakdown for a solved model
    pub fn calculate(model: &Model, results: &Results) -> Self {
        let delta_time = model.horizon.delta_time;

        let pv = &model.electrical.pv;
        let pv_investment = investment_cost(results.pv_capacity, pv.specific_investment_cost);
        let generator = &model.electrical.generator;
        let generator_investment =
            investment_cost(results.generator_capacity, generator.specific_investment_cost);
        let battery = &model.electrical.battery;
        let battery_investment =
            investment_cost(results.battery_capacity, battery.specific_investment_cost);

        let mut generator_fuel = Money(0.0);
        for output in results.generator_output.values() {
            generator_fuel += generator.fuel_cost * (*output * delta_time);
        }

        let (mut grid_purchases, mut grid_sales) = (Money(0.0), Money(0.0));
        match &model.grid {
            GridConnection::Off => {}
            GridConnection::Purchase { purchase_price, .. } => {
                for import in results.grid_import.values() {
                    grid_purchases += *purchase_price * (*import * delta_time);
                }
            }
            GridConnection::PurchaseAndSale {
                purchase_price,
                sale_price,
                ..
            } => {
                for import in results.grid_import.values() {
                    grid_purchases += *purchase_price * (*import * delta_time);
                }
                for export in results.grid_export.values() {
                    grid_sales += *sale_price * (*export * delta_time);
                }
            }
        }

        let (compressor_investment, compressor_om) = match &model.cooling.compressor {
            CoolingSource::Disabled => (Money(0.0), Money(0.0)),
            CoolingSource::Active(parameters) => {
                let investment =
                    investment_cost(results.compressor_capacity, parameters.specific_investment_cost);
                (investment, om_cost(investment, parameters.om_cost_fraction))
            }
        };

        let (
            tes_compressor_investment,
            tes_compressor_om,
            tes_tank_investment,
            tes_tank_om,
            simultaneity_penalty,
        ) = match &model.cooling.tes {
            CoolingSource::Disabled => {
                (Money(0.0), Money(0.0), Money(0.0), Money(0.0), Money(0.0))
            }
            CoolingSource::Active(parameters) => {
                let compressor_investment = investment_cost(
                    results.tes_compressor_capacity,
                    parameters.compressor_specific_investment_cost,
                );
                let tank_investment =
                    investment_cost(parameters.capacity, parameters.tank_specific_investment_cost);

                let mut penalty = Money(0.0);
                for overlap in results.tes_overlap.values() {
                    penalty += parameters.simultaneity_penalty * (*overlap * delta_time);
                }

                (
                    compressor_investment,
                    om_cost(compressor_investment, parameters.compressor_om_cost_fraction),
                    tank_investment,
                    om_cost(tank_investment, parameters.tank_om_cost_fraction),
                    penalty,
                )
            }
        };

        CostBreakdown {
            pv_investment,
            pv_om: om_cost(pv_investment, pv.om_cost_fraction),
            generator_investment,
            generator_om: om_cost(generator_investment, generator.om_cost_fraction),
            battery_investment,
            battery_om: om_cost(battery_investment, battery.om_cost_fraction),
            compressor_investment,
            compressor_om,
            tes_compressor_investment,
            tes_compressor_om,
            tes_tank_investment,
            tes_tank_om,
            generator_fuel,
            grid_purchases,
            grid_sales,
            simultaneity_penalty,
        }
    }

    /// The total system cost: all cost terms, net of grid sales revenue
    pub fn total(&self) -> Money {
        self.pv_investment
            + self.pv_om
            + self.generator_investment
            + self.generator_om
            + self.battery_investment
            + self.battery_om
            + self.compressor_investment
            + self.compressor_om
            + self.tes_compressor_investment
            + self.tes_compressor_om
            + self.tes_tank_investment
            + self.tes_tank_om
            + self.generator_fuel
            + self.grid_purchases
            + self.simultaneity_penalty
            - self.grid_sales
    }
}
