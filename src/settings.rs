//! Program settings, read from `settings.toml` in the working directory.
//!
//! Every setting is optional and a missing file is the same as an empty one. Command-line flags
//! take precedence over the file.
use crate::input::read_toml;
use crate::log::{DEFAULT_LOG_LEVEL, parse_level};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Program settings from config file
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// The program log level (`off`, `error`, `warn`, `info`, `debug` or `trace`)
    pub log_level: String,
    /// Whether to overwrite existing output folders
    pub overwrite: bool,
    /// Whether to write the optimisation model to `model.lp` in the output folder
    pub write_lp: bool,
    /// Whether to show HiGHS's own progress output
    pub verbose_solver: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            overwrite: false,
            write_lp: false,
            verbose_solver: false,
        }
    }
}

impl Settings {
    /// Read the settings file from the current working directory
    pub fn load() -> Result<Settings> {
        Self::load_from_path(Path::new(SETTINGS_FILE_NAME))
    }

    /// Read and check settings from the specified path.
    ///
    /// # Returns
    ///
    /// The settings, defaults if there is no file at `file_path`, or an error if the file can't
    /// be parsed or contains an unknown log level.
    pub fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        parse_level(&settings.log_level)
            .with_context(|| format!("Invalid log_level in {}", file_path.display()))?;

        Ok(settings)
    }
}
