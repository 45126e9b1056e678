#![allow(missing_docs)]

//! This module defines the quantity types used throughout the model and their conversions.
//!
//! Powers are in kW, energies in kWh, masses in kg, mass flows in kg/h and money in currency
//! units. Keeping quantities as distinct types means unit errors show up as type errors when
//! assembling parameters and costs; the optimisation layer works on raw `f64` coefficients
//! obtained via [`value`](Power::value).

/// Represents a dimensionless quantity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Add,
    derive_more::Sub,
)]
pub struct Dimensionless(pub f64);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless::new(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless::new(self.0 / rhs.0)
    }
}

impl Dimensionless {
    /// Creates a new dimensionless quantity.
    pub fn new(val: f64) -> Self {
        Self(val)
    }

    /// Returns the value as a f64.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether the value is finite.
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            serde::Serialize,
            serde::Deserialize,
            derive_more::Add,
            derive_more::Sub,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the value is finite.
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::ops::AddAssign for $name {
            fn add_assign(&mut self, rhs: $name) {
                self.0 += rhs.0;
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name::new(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name::new(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name::new(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Power);
unit_struct!(Energy);
unit_struct!(Mass);
unit_struct!(MassRate);
unit_struct!(Hours);
unit_struct!(Money);

// Derived quantities
unit_struct!(EnergyPerMass);
unit_struct!(MoneyPerPower);
unit_struct!(MoneyPerEnergy);
unit_struct!(MoneyPerMass);

// Multiplication rules
impl_mul!(Power, Hours, Energy);
impl_mul!(MassRate, Hours, Mass);
impl_mul!(MassRate, EnergyPerMass, Power);
impl_mul!(EnergyPerMass, Mass, Energy);
impl_mul!(MoneyPerPower, Power, Money);
impl_mul!(MoneyPerEnergy, Energy, Money);
impl_mul!(MoneyPerMass, Mass, Money);

// Division rules
impl_div!(Energy, Hours, Power);
impl_div!(Energy, Mass, EnergyPerMass);
impl_div!(Power, EnergyPerMass, MassRate);
impl_div!(Mass, Hours, MassRate);
