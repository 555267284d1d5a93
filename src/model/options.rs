//! Options controlling how the optimisation model is built.
use crate::error::ValidationError;
use crate::problem::check_fraction;
use crate::units::{Fraction, Money, MoneyPerMass};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How purchases are represented in the model
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Formulation {
    /// One purchase variable per supplier and period.
    ///
    /// Composition is enforced on the blend of all products in a period, so individual products
    /// may not have the required composition. Kept for comparison only.
    Aggregated,
    /// One purchase variable per supplier, product and period, so every product's own blend meets
    /// its composition requirement
    #[default]
    Disaggregated,
}

/// Whether an alloy requirement is an exact target or an upper limit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompositionPolicy {
    /// The blend must contain exactly the required fraction
    #[default]
    Exact,
    /// The blend may contain less than the required fraction
    AtMost,
}

/// Costs of removing excess copper by electrolysis
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Electrolysis {
    /// Cost incurred in each period in which electrolysis is used
    pub fixed_cost: Money,
    /// Cost per kilogram of copper in the period's purchases when electrolysis is used
    pub variable_cost: MoneyPerMass,
    /// Whether the copper taken out by electrolysis is lost from the melt, so that less steel is
    /// made from the same purchases
    #[serde(default)]
    pub removes_copper: bool,
}

/// A limit on the copper content of each period's purchases
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct CopperLimit {
    /// Maximum fraction of copper, relative to the period's production
    pub limit: Fraction,
    /// If set, the limit may be exceeded in a period by paying for electrolysis. Otherwise the
    /// limit is a hard constraint.
    #[serde(default)]
    pub electrolysis: Option<Electrolysis>,
    /// Override for the big-M constant used to activate electrolysis
    #[serde(default)]
    pub big_m: Option<f64>,
}

/// Options for [`build_model`](super::build_model)
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct BuildOptions {
    /// How purchases are represented
    #[serde(default)]
    pub formulation: Formulation,
    /// How alloy requirements are enforced
    #[serde(default)]
    pub composition: CompositionPolicy,
    /// Optional copper limit
    #[serde(default)]
    pub copper: Option<CopperLimit>,
}

impl BuildOptions {
    /// Check that the numeric options are in range
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(copper) = &self.copper else {
            return Ok(());
        };

        check_fraction("copper limit", "options", copper.limit)?;
        if let Some(big_m) = copper.big_m {
            check_cost("big_m", big_m)?;
        }
        if let Some(electrolysis) = &copper.electrolysis {
            check_cost("electrolysis fixed_cost", electrolysis.fixed_cost.value())?;
            check_cost(
                "electrolysis variable_cost",
                electrolysis.variable_cost.value(),
            )?;
        }

        Ok(())
    }

    /// A copy of these options with the copper limit replaced.
    ///
    /// Any electrolysis settings and big-M override are kept. If no copper limit was configured,
    /// the new limit is a hard one.
    pub fn with_copper_limit(&self, limit: Fraction) -> Self {
        let copper = match self.copper {
            Some(copper) => CopperLimit { limit, ..copper },
            None => CopperLimit {
                limit,
                electrolysis: None,
                big_m: None,
            },
        };

        Self {
            copper: Some(copper),
            ..*self
        }
    }
}

fn check_cost(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: field.to_string(),
            id: "options".to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue {
            field: field.to_string(),
            id: "options".to_string(),
            value,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn copper(limit: f64, fixed_cost: f64, big_m: Option<f64>) -> BuildOptions {
        BuildOptions {
            copper: Some(CopperLimit {
                limit: Fraction(limit),
                electrolysis: Some(Electrolysis {
                    fixed_cost: Money(fixed_cost),
                    variable_cost: MoneyPerMass(5.0),
                    removes_copper: false,
                }),
                big_m,
            }),
            ..BuildOptions::default()
        }
    }

    #[test]
    fn test_defaults() {
        let options = BuildOptions::default();
        assert_eq!(options.formulation, Formulation::Disaggregated);
        assert_eq!(options.composition, CompositionPolicy::Exact);
        assert!(options.copper.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!(
            Formulation::from_str("aggregated").unwrap(),
            Formulation::Aggregated
        );
        assert_eq!(
            CompositionPolicy::from_str("at_most").unwrap(),
            CompositionPolicy::AtMost
        );
        assert_eq!(CompositionPolicy::AtMost.to_string(), "at_most");
    }

    #[rstest]
    #[case(copper(0.02, 100.0, None), true)]
    #[case(copper(0.02, 100.0, Some(10.0)), true)]
    #[case(copper(1.5, 100.0, None), false)]
    #[case(copper(-0.1, 100.0, None), false)]
    #[case(copper(0.02, -1.0, None), false)]
    #[case(copper(0.02, f64::INFINITY, None), false)]
    #[case(copper(0.02, 100.0, Some(-5.0)), false)]
    fn test_validate(#[case] options: BuildOptions, #[case] valid: bool) {
        assert_eq!(options.validate().is_ok(), valid);
    }

    #[test]
    fn test_with_copper_limit() {
        let options = copper(0.02, 100.0, Some(10.0)).with_copper_limit(Fraction(0.03));
        let copper = options.copper.unwrap();
        assert_eq!(copper.limit, Fraction(0.03));
        assert_eq!(copper.big_m, Some(10.0));
        assert!(copper.electrolysis.is_some());

        let options = BuildOptions::default().with_copper_limit(Fraction(0.01));
        let copper = options.copper.unwrap();
        assert_eq!(copper.limit, Fraction(0.01));
        assert!(copper.electrolysis.is_none());
    }

    #[test]
    fn test_deserialise() {
        let toml = r#"
            formulation = "aggregated"

            [copper]
            limit = 0.02

            [copper.electrolysis]
            fixed_cost = 100.0
            variable_cost = 5.0
        "#;
        let options: BuildOptions = toml::from_str(toml).unwrap();
        assert_eq!(options.formulation, Formulation::Aggregated);
        assert_eq!(options.composition, CompositionPolicy::Exact);
        assert_eq!(
            options.copper.unwrap().electrolysis.unwrap().fixed_cost,
            Money(100.0)
        );
    }
}
