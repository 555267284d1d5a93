//! Code for reading demand data from a CSV file.
use super::{input_err_msg, read_csv};
use crate::id::{ProductID, get_index_by_str};
use crate::units::Mass;
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const DEMAND_FILE_NAME: &str = "demand.csv";

/// One entry of the demand file
#[derive(Debug, Deserialize, PartialEq)]
struct DemandRaw {
    period: String,
    product_id: String,
    demand: f64,
}

/// Read the demand file and arrange it as a `[period][product]` matrix.
///
/// Combinations of period and product which don't appear in the file have zero demand.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `product_ids` - All product IDs, in order
/// * `periods` - Period labels from the model file. If `None`, periods are taken from the demand
///   file in order of first appearance.
///
/// # Returns
///
/// The period labels and the demand matrix.
pub fn read_demand(
    model_dir: &Path,
    product_ids: &IndexSet<ProductID>,
    periods: Option<&[String]>,
) -> Result<(Vec<String>, Vec<Vec<Mass>>)> {
    let file_path = model_dir.join(DEMAND_FILE_NAME);
    let entries = read_csv::<DemandRaw>(&file_path)?;
    read_demand_from_entries(entries, product_ids, periods)
        .with_context(|| input_err_msg(&file_path))
}

fn read_demand_from_entries(
    entries: Vec<DemandRaw>,
    product_ids: &IndexSet<ProductID>,
    periods: Option<&[String]>,
) -> Result<(Vec<String>, Vec<Vec<Mass>>)> {
    let labels: IndexSet<String> = match periods {
        Some(periods) => {
            let labels: IndexSet<String> = periods.iter().cloned().collect();
            ensure!(
                labels.len() == periods.len(),
                "Period labels must be unique"
            );
            labels
        }
        None => entries.iter().map(|entry| entry.period.clone()).collect(),
    };

    let mut demand: Vec<Vec<Option<Mass>>> = vec![vec![None; product_ids.len()]; labels.len()];
    for entry in entries {
        let t = labels
            .get_index_of(entry.period.as_str())
            .with_context(|| format!("Unknown period {}", entry.period))?;
        let j = get_index_by_str(product_ids, &entry.product_id)?;
        let cell = &mut demand[t][j];
        ensure!(
            cell.is_none(),
            "Demand for product {} in period {} given more than once",
            entry.product_id,
            entry.period
        );
        *cell = Some(Mass(entry.demand));
    }

    let demand: Vec<Vec<Mass>> = demand
        .into_iter()
        .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
        .collect();

    Ok((labels.into_iter().collect(), demand))
}
