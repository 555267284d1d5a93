//! Code for reading the model file.
use super::read_toml;
use crate::model::BuildOptions;
use crate::solver::SolveOptions;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const MODEL_FILE_NAME: &str = "model.toml";

/// Solver settings from the model file
#[derive(Debug, Default, Deserialize, PartialEq, Clone)]
pub struct SolverConfig {
    /// Give up after this many seconds
    pub time_limit_secs: Option<f64>,
    /// Relative MIP gap at which to stop
    #[serde(default)]
    pub gap_tolerance: f64,
}

impl SolverConfig {
    /// Convert into options for a solver
    pub fn to_solve_options(&self, verbose: bool) -> SolveOptions {
        SolveOptions {
            gap_tolerance: self.gap_tolerance,
            time_limit: self.time_limit_secs.map(Duration::from_secs_f64),
            verbose,
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(secs) = self.time_limit_secs {
            ensure!(
                secs.is_finite() && secs > 0.0,
                "time_limit_secs must be a positive number of seconds"
            );
        }
        ensure!(
            self.gap_tolerance.is_finite() && self.gap_tolerance >= 0.0,
            "gap_tolerance must be non-negative"
        );

        Ok(())
    }
}

/// Model definition
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelFile {
    /// Plant capacity per period
    pub max_production: f64,
    /// Labels for the periods of the planning horizon, in order.
    ///
    /// If omitted, periods are taken from the demand file in order of first appearance.
    pub periods: Option<Vec<String>>,
    /// Options controlling how the optimisation model is built
    #[serde(default)]
    pub options: BuildOptions,
    /// Solver settings
    #[serde(default)]
    pub solver: SolverConfig,
}

impl ModelFile {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelFile`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelFile> {
        let file_path = model_dir.as_ref().join(MODEL_FILE_NAME);
        read_toml(&file_path)
    }

    /// Check the values which can be checked without the rest of the model
    pub fn validate(&self) -> Result<()> {
        if let Some(periods) = &self.periods {
            ensure!(!periods.is_empty(), "periods cannot be empty");
        }
        self.options
            .validate()
            .context("Invalid options in model file")?;
        self.solver.validate()
    }
}
