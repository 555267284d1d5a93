//! Code for reading product (steel grade) information from a CSV file.
use super::read_csv;
use crate::problem::Product;
use crate::units::{Fraction, MoneyPerMass};
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

const PRODUCTS_FILE_NAME: &str = "products.csv";

#[derive(Debug, Deserialize, PartialEq)]
struct ProductRaw {
    id: String,
    chromium: f64,
    nickel: f64,
    holding_cost: f64,
}

/// Read steel grades from the products CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The products, in file order.
pub fn read_products(model_dir: &Path) -> Result<Vec<Product>> {
    let file_path = model_dir.join(PRODUCTS_FILE_NAME);
    let products = read_csv::<ProductRaw>(&file_path)?
        .into_iter()
        .map(|raw| Product {
            id: raw.id.into(),
            chromium: Fraction(raw.chromium),
            nickel: Fraction(raw.nickel),
            holding_cost: MoneyPerMass(raw.holding_cost),
        })
        .collect();

    Ok(products)
}
