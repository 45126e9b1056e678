//! Parameters for the electrical technologies of the base microgrid.
//!
//! These cover the supply side of the electrical balance: PV, a dispatchable generator, battery
//! storage and an optional grid connection. Capacities are decision variables sized by the
//! optimisation; the parameters here bound them and price them.
use crate::input::{deserialise_proportion, deserialise_proportion_nonzero};
use crate::units::{Dimensionless, Energy, MoneyPerEnergy, MoneyPerPower, Power};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;

/// Check that an optional capacity bound is a positive, finite number
fn check_capacity_bound(value: Option<f64>, name: &str) -> Result<()> {
    if let Some(value) = value {
        ensure!(
            value.is_finite() && value > 0.0,
            "{name} must be a finite number greater than zero"
        );
    }

    Ok(())
}

/// Check that a cost parameter is non-negative and finite
fn check_cost(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a non-negative finite number"
    );

    Ok(())
}

/// Parameters for the PV installation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PvParameters {
    /// Investment cost per kW of installed capacity
    pub specific_investment_cost: MoneyPerPower,
    /// Annual O&M cost as a fraction of the investment cost
    #[serde(deserialize_with = "deserialise_proportion")]
    pub om_cost_fraction: Dimensionless,
    /// Upper bound on the installed capacity [kW]
    #[serde(default)]
    pub max_capacity: Option<Power>,
}

impl PvParameters {
    /// Check that the parameters are valid
    pub fn validate(&self) -> Result<()> {
        check_cost(self.specific_investment_cost.value(), "specific_investment_cost")?;
        check_capacity_bound(self.max_capacity.map(Power::value), "max_capacity")?;

        Ok(())
    }
}

/// Parameters for the dispatchable generator
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratorParameters {
    /// Investment cost per kW of installed capacity
    pub specific_investment_cost: MoneyPerPower,
    /// Annual O&M cost as a fraction of the investment cost
    #[serde(deserialize_with = "deserialise_proportion")]
    pub om_cost_fraction: Dimensionless,
    /// Fuel cost per kWh of electricity produced
    pub fuel_cost: MoneyPerEnergy,
    /// Upper bound on the installed capacity [kW]
    #[serde(default)]
    pub max_capacity: Option<Power>,
}

impl GeneratorParameters {
    /// Check that the parameters are valid
    pub fn validate(&self) -> Result<()> {
        check_cost(self.specific_investment_cost.value(), "specific_investment_cost")?;
        check_cost(self.fuel_cost.value(), "fuel_cost")?;
        check_capacity_bound(self.max_capacity.map(Power::value), "max_capacity")?;

        Ok(())
    }
}

/// Parameters for the battery storage
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatteryParameters {
    /// Investment cost per kWh of installed capacity
    pub specific_investment_cost: MoneyPerEnergy,
    /// Annual O&M cost as a fraction of the investment cost
    #[serde(deserialize_with = "deserialise_proportion")]
    pub om_cost_fraction: Dimensionless,
    /// Fraction of charged energy that reaches the store
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub charge_efficiency: Dimensionless,
    /// Fraction of discharged energy that reaches the busbar
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub discharge_efficiency: Dimensionless,
    /// Fraction of the installed capacity that can be charged or discharged per hour
    pub rate_limit: Dimensionless,
    /// Upper bound on the installed capacity [kWh]
    #[serde(default)]
    pub max_capacity: Option<Energy>,
}

impl BatteryParameters {
    /// Check that the parameters are valid
    pub fn validate(&self) -> Result<()> {
        check_cost(self.specific_investment_cost.value(), "specific_investment_cost")?;
        ensure!(
            self.rate_limit.is_finite() && self.rate_limit > Dimensionless(0.0),
            "rate_limit must be a finite number greater than zero"
        );
        check_capacity_bound(self.max_capacity.map(Energy::value), "max_capacity")?;

        Ok(())
    }
}

/// The kind of grid connection available to the microgrid
#[derive(Debug, Clone, Copy, PartialEq, DeserializeLabeledStringEnum)]
pub enum ConnectionType {
    /// No grid connection
    #[string = "none"]
    None,
    /// Electricity can be purchased from the grid
    #[string = "purchase_only"]
    PurchaseOnly,
    /// Electricity can be purchased from and sold to the grid
    #[string = "purchase_and_sale"]
    PurchaseAndSale,
}

/// The grid connection section of the model file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridConfig {
    /// The kind of grid connection
    pub connection: ConnectionType,
    /// Maximum import power [kW]
    #[serde(default)]
    pub max_import: Option<Power>,
    /// Price per kWh of electricity purchased
    #[serde(default)]
    pub purchase_price: Option<MoneyPerEnergy>,
    /// Maximum export power [kW]
    #[serde(default)]
    pub max_export: Option<Power>,
    /// Price per kWh of electricity sold
    #[serde(default)]
    pub sale_price: Option<MoneyPerEnergy>,
}

/// The validated grid connection of the model.
///
/// Built once from [`GridConfig`] when the model is loaded, so the dispatch layer never has to
/// deal with partially-specified grid parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum GridConnection {
    /// No grid connection: no import or export variables exist
    Off,
    /// Purchase only
    Purchase {
        /// Maximum import power [kW]
        max_import: Power,
        /// Price per kWh of electricity purchased
        purchase_price: MoneyPerEnergy,
    },
    /// Purchase and sale
    PurchaseAndSale {
        /// Maximum import power [kW]
        max_import: Power,
        /// Price per kWh of electricity purchased
        purchase_price: MoneyPerEnergy,
        /// Maximum export power [kW]
        max_export: Power,
        /// Price per kWh of electricity sold
        sale_price: MoneyPerEnergy,
    },
}

impl GridConfig {
    /// Build the validated grid connection from the configuration
    pub fn build(&self) -> Result<GridConnection> {
        if self.connection == ConnectionType::None {
            return Ok(GridConnection::Off);
        }

        let max_import = self.max_import.context("max_import is required")?;
        let purchase_price = self.purchase_price.context("purchase_price is required")?;
        check_capacity_bound(Some(max_import.value()), "max_import")?;
        check_cost(purchase_price.value(), "purchase_price")?;

        if self.connection == ConnectionType::PurchaseOnly {
            return Ok(GridConnection::Purchase {
                max_import,
                purchase_price,
            });
        }

        let max_export = self.max_export.context("max_export is required")?;
        let sale_price = self.sale_price.context("sale_price is required")?;
        check_capacity_bound(Some(max_export.value()), "max_export")?;
        check_cost(sale_price.value(), "sale_price")?;

        // An export price above the import price would let the optimiser buy and resell without
        // limit, making the problem unbounded
        ensure!(
            sale_price <= purchase_price,
            "sale_price must not exceed purchase_price"
        );

        Ok(GridConnection::PurchaseAndSale {
            max_import,
            purchase_price,
            max_export,
            sale_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(900.0, Some(500.0), true)]
    #[case(0.0, None, true)] // zero cost is allowed
    #[case(-1.0, None, false)] // negative cost
    #[case(900.0, Some(0.0), false)] // zero bound
    #[case(f64::NAN, None, false)]
    fn test_pv_validate(
        #[case] investment_cost: f64,
        #[case] max_capacity: Option<f64>,
        #[case] expected_valid: bool,
    ) {
        let pv = PvParameters {
            specific_investment_cost: MoneyPerPower(investment_cost),
            om_cost_fraction: Dimensionless(0.02),
            max_capacity: max_capacity.map(Power),
        };
        assert_eq!(pv.validate().is_ok(), expected_valid);
    }

    #[rstest]
    #[case(0.35, true)]
    #[case(0.0, true)]
    #[case(-0.1, false)]
    #[case(f64::INFINITY, false)]
    fn test_generator_validate(#[case] fuel_cost: f64, #[case] expected_valid: bool) {
        let generator = GeneratorParameters {
            specific_investment_cost: MoneyPerPower(700.0),
            om_cost_fraction: Dimensionless(0.02),
            fuel_cost: MoneyPerEnergy(fuel_cost),
            max_capacity: None,
        };
        assert_eq!(generator.validate().is_ok(), expected_valid);
    }

    #[rstest]
    #[case(0.5, true)]
    #[case(0.0, false)] // battery could never cycle
    #[case(-0.5, false)]
    #[case(f64::NAN, false)]
    fn test_battery_validate(#[case] rate_limit: f64, #[case] expected_valid: bool) {
        let battery = BatteryParameters {
            specific_investment_cost: MoneyPerEnergy(400.0),
            om_cost_fraction: Dimensionless(0.01),
            charge_efficiency: Dimensionless(0.95),
            discharge_efficiency: Dimensionless(0.95),
            rate_limit: Dimensionless(rate_limit),
            max_capacity: None,
        };
        assert_eq!(battery.validate().is_ok(), expected_valid);
    }

    #[test]
    fn test_grid_build_off() {
        let config = GridConfig {
            connection: ConnectionType::None,
            max_import: None,
            purchase_price: None,
            max_export: None,
            sale_price: None,
        };
        assert_eq!(config.build().unwrap(), GridConnection::Off);
    }

    #[test]
    fn test_grid_build_purchase() {
        let mut config = GridConfig {
            connection: ConnectionType::PurchaseOnly,
            max_import: Some(Power(100.0)),
            purchase_price: Some(MoneyPerEnergy(0.25)),
            max_export: None,
            sale_price: None,
        };
        assert_eq!(
            config.build().unwrap(),
            GridConnection::Purchase {
                max_import: Power(100.0),
                purchase_price: MoneyPerEnergy(0.25),
            }
        );

        // Missing import bound is an error for a connected grid
        config.max_import = None;
        assert!(config.build().is_err());
    }

    #[test]
    fn test_grid_build_purchase_and_sale() {
        let mut config = GridConfig {
            connection: ConnectionType::PurchaseAndSale,
            max_import: Some(Power(100.0)),
            purchase_price: Some(MoneyPerEnergy(0.25)),
            max_export: Some(Power(50.0)),
            sale_price: Some(MoneyPerEnergy(0.10)),
        };
        assert!(config.build().is_ok());

        // Sale price above purchase price would make the problem unbounded
        config.sale_price = Some(MoneyPerEnergy(0.30));
        assert!(config.build().is_err());
    }
}
