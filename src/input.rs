//! Common routines for handling input data.
use crate::id::ProductID;
use crate::model::BuildOptions;
use crate::problem::Problem;
use crate::units::Mass;
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

mod demand;
use demand::read_demand;
mod model_file;
pub use model_file::{ModelFile, SolverConfig};
mod product;
use product::read_products;
mod supplier;
use supplier::read_suppliers;

/// Read a series of type `T`s from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
///
/// # Returns
///
/// The records in the file, or an error if the file is missing, malformed or empty.
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;

    let records: Vec<T> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .with_context(|| input_err_msg(file_path))?;
    ensure!(
        !records.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(records)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;

    Ok(toml_data)
}

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// A model loaded from a model directory
#[derive(Debug)]
pub struct LoadedModel {
    /// The validated problem data
    pub problem: Problem,
    /// Options for building the optimisation model
    pub build_options: BuildOptions,
    /// Options for the solver
    pub solver_config: SolverConfig,
}

/// Load a model from the specified directory.
///
/// The directory must contain `model.toml`, `suppliers.csv`, `products.csv` and `demand.csv`.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<LoadedModel> {
    let model_dir = model_dir.as_ref();
    let model_file = ModelFile::from_path(model_dir)?;
    model_file.validate()?;

    let suppliers = read_suppliers(model_dir)?;
    let products = read_products(model_dir)?;
    let product_ids: IndexSet<ProductID> = products.iter().map(|p| p.id.clone()).collect();
    let (period_labels, demand) =
        read_demand(model_dir, &product_ids, model_file.periods.as_deref())?;

    let problem = Problem::new(
        suppliers,
        products,
        period_labels,
        demand,
        Mass(model_file.max_production),
    )
    .context("Invalid model data")?;

    Ok(LoadedModel {
        problem,
        build_options: model_file.options,
        solver_config: model_file.solver,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    /// Create an example CSV file in dir_path
    fn create_csv_file(dir_path: &Path, contents: &str) -> PathBuf {
        let file_path = dir_path.join("test.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id, value\nhello, 1\nworld, 2");
        let records: Vec<Record> = read_csv(&file_path).unwrap();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".to_string(),
                    value: 1,
                },
                Record {
                    id: "world".to_string(),
                    value: 2,
                }
            ]
        );

        // Empty file with header
        let file_path = create_csv_file(dir.path(), "id,value");
        assert!(read_csv::<Record>(&file_path).is_err());

        // Missing file
        assert!(read_csv::<Record>(&dir.path().join("nope.csv")).is_err());
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"\nvalue = 1").unwrap();
        }

        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                id: "hello".to_string(),
                value: 1,
            }
        );

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "bad toml syntax").unwrap();
        }

        assert!(read_toml::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_input_err_msg() {
        assert_eq!(
            input_err_msg("model.toml"),
            "Error reading model.toml".to_string()
        );
    }
}
