//! Code for reading supplier information from a CSV file.
use super::read_csv;
use crate::problem::Supplier;
use crate::units::{Fraction, Mass, MoneyPerMass};
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

const SUPPLIERS_FILE_NAME: &str = "suppliers.csv";

/// A supplier as it appears in the CSV file
#[derive(Debug, Deserialize, PartialEq)]
struct SupplierRaw {
    id: String,
    cost: f64,
    capacity: f64,
    chromium: f64,
    nickel: f64,
    copper: f64,
}

impl From<SupplierRaw> for Supplier {
    fn from(raw: SupplierRaw) -> Self {
        Supplier {
            id: raw.id.into(),
            cost: MoneyPerMass(raw.cost),
            capacity: Mass(raw.capacity),
            chromium: Fraction(raw.chromium),
            nickel: Fraction(raw.nickel),
            copper: Fraction(raw.copper),
        }
    }
}

/// Read suppliers from the suppliers CSV file.
///
/// Values are range-checked later, when the [`Problem`](crate::problem::Problem) is created.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The suppliers, in file order.
pub fn read_suppliers(model_dir: &Path) -> Result<Vec<Supplier>> {
    let file_path = model_dir.join(SUPPLIERS_FILE_NAME);
    let suppliers = read_csv::<SupplierRaw>(&file_path)?;

    Ok(suppliers.into_iter().map(Supplier::from).collect())
}
