//! The data model for a production planning problem.
//!
//! A [`Problem`] is built once from static tables, validated, and then only read from. Periods are
//! identified by their position in the planning horizon, starting from zero.
use crate::error::ValidationError;
use crate::id::{ProductID, SupplierID};
use crate::units::{Fraction, Mass, MoneyPerMass};
use serde::Deserialize;
use std::collections::HashSet;
use strum::{Display, EnumIter};

/// The index of a period within the planning horizon
pub type Period = usize;

/// An alloying element whose proportion in the finished steel is controlled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Alloy {
    /// Chromium
    Chromium,
    /// Nickel
    Nickel,
}

/// A supplier of scrap material
#[derive(Debug, Clone, PartialEq)]
pub struct Supplier {
    /// Unique identifier for the supplier
    pub id: SupplierID,
    /// Cost of one kilogram of scrap
    pub cost: MoneyPerMass,
    /// Maximum amount of scrap which can be bought in a single period
    pub capacity: Mass,
    /// Fraction of chromium in the scrap
    pub chromium: Fraction,
    /// Fraction of nickel in the scrap
    pub nickel: Fraction,
    /// Fraction of copper in the scrap
    pub copper: Fraction,
}

impl Supplier {
    /// The fraction of the given alloy in this supplier's scrap
    pub fn alloy_content(&self, alloy: Alloy) -> Fraction {
        match alloy {
            Alloy::Chromium => self.chromium,
            Alloy::Nickel => self.nickel,
        }
    }
}

/// A grade of steel which can be produced
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Unique identifier for the grade (e.g. "18/10")
    pub id: ProductID,
    /// Required fraction of chromium
    pub chromium: Fraction,
    /// Required fraction of nickel
    pub nickel: Fraction,
    /// Cost of holding one kilogram in stock for one period
    pub holding_cost: MoneyPerMass,
}

impl Product {
    /// The required fraction of the given alloy for this grade
    pub fn alloy_requirement(&self, alloy: Alloy) -> Fraction {
        match alloy {
            Alloy::Chromium => self.chromium,
            Alloy::Nickel => self.nickel,
        }
    }
}

/// The raw tables from which a [`Problem`] is constructed.
///
/// Supplier tables must all have one entry per supplier and product tables one entry per product.
/// `demand` has one row per period, with one entry per product in each row.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProblemTables {
    /// Supplier IDs
    pub supplier_ids: Vec<String>,
    /// Cost per kilogram for each supplier
    pub supplier_costs: Vec<f64>,
    /// Per-period supply limit for each supplier
    pub supplier_capacities: Vec<f64>,
    /// Chromium fraction for each supplier
    pub supplier_chromium: Vec<f64>,
    /// Nickel fraction for each supplier
    pub supplier_nickel: Vec<f64>,
    /// Copper fraction for each supplier
    pub supplier_copper: Vec<f64>,
    /// Product IDs
    pub product_ids: Vec<String>,
    /// Required chromium fraction for each product
    pub product_chromium: Vec<f64>,
    /// Required nickel fraction for each product
    pub product_nickel: Vec<f64>,
    /// Holding cost for each product
    pub product_holding_costs: Vec<f64>,
    /// Optional display labels for periods (e.g. month names)
    #[serde(default)]
    pub period_labels: Option<Vec<String>>,
    /// Demand matrix, indexed as `demand[period][product]`
    pub demand: Vec<Vec<f64>>,
    /// Plant capacity per period
    pub max_production: f64,
}

/// A validated, read-only production planning problem
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    suppliers: Vec<Supplier>,
    products: Vec<Product>,
    period_labels: Vec<String>,
    demand: Vec<Vec<Mass>>,
    max_production: Mass,
}

/// Check that a table has the expected number of entries
fn check_len(table: &str, actual: usize, expected: usize) -> Result<(), ValidationError> {
    if actual != expected {
        return Err(ValidationError::ShapeMismatch {
            table: table.to_string(),
            expected,
            actual,
        });
    }

    Ok(())
}

/// Check that a value is finite and non-negative
fn check_non_negative(field: &str, id: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: field.to_string(),
            id: id.to_string(),
        });
    }

    if value < 0.0 {
        return Err(ValidationError::NegativeValue {
            field: field.to_string(),
            id: id.to_string(),
            value,
        });
    }

    Ok(())
}

/// Check that a value lies within [0, 1]
pub(crate) fn check_fraction(field: &str, id: &str, value: Fraction) -> Result<(), ValidationError> {
    if !value.is_valid() {
        return Err(ValidationError::FractionOutOfRange {
            field: field.to_string(),
            id: id.to_string(),
            value: value.value(),
        });
    }

    Ok(())
}

/// Check that every ID in the iterator is unique
fn check_unique_ids<'a, I>(kind: &str, ids: I) -> Result<(), ValidationError>
where
    I: Iterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                kind: kind.to_string(),
                id: id.to_string(),
            });
        }
    }

    Ok(())
}

fn validate_supplier(supplier: &Supplier) -> Result<(), ValidationError> {
    let id = &*supplier.id.0;
    check_non_negative("cost", id, supplier.cost.value())?;
    check_non_negative("capacity", id, supplier.capacity.value())?;
    check_fraction("chromium", id, supplier.chromium)?;
    check_fraction("nickel", id, supplier.nickel)?;
    check_fraction("copper", id, supplier.copper)?;

    Ok(())
}

fn validate_product(product: &Product) -> Result<(), ValidationError> {
    let id = &*product.id.0;
    check_fraction("chromium", id, product.chromium)?;
    check_fraction("nickel", id, product.nickel)?;
    check_non_negative("holding_cost", id, product.holding_cost.value())?;

    Ok(())
}

impl Problem {
    /// Create a new [`Problem`], checking that the data is consistent.
    ///
    /// # Arguments
    ///
    /// * `suppliers` - The scrap suppliers
    /// * `products` - The steel grades
    /// * `period_labels` - Display labels, one per period
    /// * `demand` - Demand indexed as `demand[period][product]`
    /// * `max_production` - Plant capacity per period
    pub fn new(
        suppliers: Vec<Supplier>,
        products: Vec<Product>,
        period_labels: Vec<String>,
        demand: Vec<Vec<Mass>>,
        max_production: Mass,
    ) -> Result<Self, ValidationError> {
        check_len("period labels", period_labels.len(), demand.len())?;
        for (label, row) in period_labels.iter().zip(demand.iter()) {
            check_len(&format!("demand for period {label}"), row.len(), products.len())?;
        }

        check_unique_ids("supplier", suppliers.iter().map(|s| &*s.id.0))?;
        check_unique_ids("product", products.iter().map(|p| &*p.id.0))?;
        check_unique_ids("period", period_labels.iter().map(String::as_str))?;
        suppliers.iter().try_for_each(validate_supplier)?;
        products.iter().try_for_each(validate_product)?;

        for (label, row) in period_labels.iter().zip(demand.iter()) {
            for (product, demand) in products.iter().zip(row.iter()) {
                check_non_negative(
                    &format!("demand in period {label}"),
                    &product.id.0,
                    demand.value(),
                )?;
            }
        }
        check_non_negative("max_production", "plant", max_production.value())?;

        Ok(Self {
            suppliers,
            products,
            period_labels,
            demand,
            max_production,
        })
    }

    /// Create a [`Problem`] from literal tables, checking their shapes and values.
    pub fn from_tables(tables: ProblemTables) -> Result<Self, ValidationError> {
        let num_suppliers = tables.supplier_ids.len();
        check_len("supplier_costs", tables.supplier_costs.len(), num_suppliers)?;
        check_len(
            "supplier_capacities",
            tables.supplier_capacities.len(),
            num_suppliers,
        )?;
        check_len(
            "supplier_chromium",
            tables.supplier_chromium.len(),
            num_suppliers,
        )?;
        check_len("supplier_nickel", tables.supplier_nickel.len(), num_suppliers)?;
        check_len("supplier_copper", tables.supplier_copper.len(), num_suppliers)?;

        let num_products = tables.product_ids.len();
        check_len(
            "product_chromium",
            tables.product_chromium.len(),
            num_products,
        )?;
        check_len("product_nickel", tables.product_nickel.len(), num_products)?;
        check_len(
            "product_holding_costs",
            tables.product_holding_costs.len(),
            num_products,
        )?;
        for (t, row) in tables.demand.iter().enumerate() {
            check_len(&format!("demand row {t}"), row.len(), num_products)?;
        }

        let suppliers = (0..num_suppliers)
            .map(|i| Supplier {
                id: tables.supplier_ids[i].as_str().into(),
                cost: MoneyPerMass(tables.supplier_costs[i]),
                capacity: Mass(tables.supplier_capacities[i]),
                chromium: Fraction(tables.supplier_chromium[i]),
                nickel: Fraction(tables.supplier_nickel[i]),
                copper: Fraction(tables.supplier_copper[i]),
            })
            .collect();
        let products = (0..num_products)
            .map(|j| Product {
                id: tables.product_ids[j].as_str().into(),
                chromium: Fraction(tables.product_chromium[j]),
                nickel: Fraction(tables.product_nickel[j]),
                holding_cost: MoneyPerMass(tables.product_holding_costs[j]),
            })
            .collect();
        let period_labels = tables
            .period_labels
            .unwrap_or_else(|| default_period_labels(tables.demand.len()));
        let demand = tables
            .demand
            .into_iter()
            .map(|row| row.into_iter().map(Mass).collect())
            .collect();

        Self::new(
            suppliers,
            products,
            period_labels,
            demand,
            Mass(tables.max_production),
        )
    }

    /// The scrap suppliers
    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    /// The steel grades
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// The number of periods in the planning horizon
    pub fn num_periods(&self) -> usize {
        self.demand.len()
    }

    /// Iterate over the periods in order
    pub fn periods(&self) -> std::ops::Range<Period> {
        0..self.num_periods()
    }

    /// The display label for a period
    pub fn period_label(&self, period: Period) -> &str {
        &self.period_labels[period]
    }

    /// The display labels for all periods
    pub fn period_labels(&self) -> &[String] {
        &self.period_labels
    }

    /// The demand for the product at `product_index` in `period`
    pub fn demand(&self, product_index: usize, period: Period) -> Mass {
        self.demand[period][product_index]
    }

    /// Plant capacity per period
    pub fn max_production(&self) -> Mass {
        self.max_production
    }

    /// The largest mass of copper which can be bought in a single period.
    ///
    /// This is the tightest bound available for the copper content of a period's purchases without
    /// solving the model.
    pub fn max_copper_in_period(&self) -> Mass {
        self.suppliers.iter().map(|s| s.copper * s.capacity).sum()
    }

    /// The largest meaningful quantity in the model.
    ///
    /// Used to judge whether constants such as big-M values are out of proportion to the rest of
    /// the model.
    pub fn natural_scale(&self) -> f64 {
        let total_supply: f64 = self.suppliers.iter().map(|s| s.capacity.value()).sum();
        let max_demand = self
            .demand
            .iter()
            .flatten()
            .map(|d| d.value())
            .fold(0.0, f64::max);

        total_supply.max(self.max_production.value()).max(max_demand)
    }
}

/// Labels used when none are provided: "1", "2", ...
fn default_period_labels(num_periods: usize) -> Vec<String> {
    (1..=num_periods).map(|t| t.to_string()).collect()
}
