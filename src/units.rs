//! This module defines the unit types used for quantities in the planning problem.
//!
//! All quantities are stored as `f64`s wrapped in newtypes, so that a cost can't accidentally be
//! used where a mass is expected (and vice versa).
use serde::{Deserialize, Serialize};

macro_rules! unit_struct {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Display,
        )]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// The underlying value of the quantity
            pub const fn value(self) -> f64 {
                self.0
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $name> for $name {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl std::ops::Mul<Fraction> for $name {
            type Output = $name;

            fn mul(self, rhs: Fraction) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Fraction {
            type Output = $name;

            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }
    };
}

/// A dimensionless proportion, e.g. the fraction of chromium in a kilogram of scrap.
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct Fraction(pub f64);

impl Fraction {
    /// The underlying value of the fraction
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Whether the fraction lies within [0, 1]
    pub fn is_valid(self) -> bool {
        (0.0..=1.0).contains(&self.0)
    }
}

unit_struct!(Mass, "A mass of material, in kilograms.");
unit_struct!(Money, "An amount of money.");
unit_struct!(MoneyPerMass, "A cost per kilogram of material.");

impl std::ops::Mul<Mass> for MoneyPerMass {
    type Output = Money;

    fn mul(self, rhs: Mass) -> Money {
        Money(self.0 * rhs.0)
    }
}

impl std::ops::Mul<MoneyPerMass> for Mass {
    type Output = Money;

    fn mul(self, rhs: MoneyPerMass) -> Money {
        Money(self.0 * rhs.0)
    }
}
