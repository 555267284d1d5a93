//! Program logging, built on `fern`.
//!
//! Console output is split by severity: warnings and errors go to stderr and everything else to
//! stdout, coloured when the stream is a terminal. Runs with an output folder also get two log
//! files there: one for the run as a whole and one with only warnings and errors.
//!
//! The level comes from the `STEELPLAN_LOG_LEVEL` environment variable if it is set, then from
//! `settings.toml`, then [`DEFAULT_LOG_LEVEL`].
use anyhow::{Context, Result};
use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::{Level, LevelFilter};
use std::env;
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// Set once the logger has been initialised
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Environment variable which overrides the log level from the settings file
pub const LOG_LEVEL_ENV_VAR: &str = "STEELPLAN_LOG_LEVEL";

/// The log level used if none is given elsewhere
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log file for the whole run (below warning level)
const LOG_INFO_FILE_NAME: &str = "steelplan_info.log";

/// Log file for warnings and errors
const LOG_ERROR_FILE_NAME: &str = "steelplan_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Parse a log level name, e.g. `warn` or `DEBUG`
pub fn parse_level(name: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(name.trim())
        .ok()
        .with_context(|| format!("Unknown log level: {name}"))
}

/// Pick the log level, preferring the environment over the settings file
fn resolve_level(from_env: Option<&str>, from_settings: Option<&str>) -> Result<LevelFilter> {
    match from_env {
        Some(name) => {
            parse_level(name).with_context(|| format!("Bad value for {LOG_LEVEL_ENV_VAR}"))
        }
        None => parse_level(from_settings.unwrap_or(DEFAULT_LOG_LEVEL)),
    }
}

/// Output for one console stream.
///
/// stderr receives warnings and errors; stdout receives the rest.
fn console_dispatch(level: LevelFilter, to_stderr: bool) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack);
    let use_colour = if to_stderr {
        std::io::stderr().is_terminal()
    } else {
        std::io::stdout().is_terminal()
    };

    let dispatch = Dispatch::new().format(move |out, message, record| {
        let time = Local::now().format("%H:%M:%S");
        if use_colour {
            let level = colours.color(record.level());
            out.finish(format_args!("[{time} {level}] {message}"));
        } else {
            out.finish(format_args!("[{time} {}] {message}", record.level()));
        }
    });

    if to_stderr {
        dispatch
            .level(level.min(LevelFilter::Warn))
            .chain(std::io::stderr())
    } else {
        dispatch
            .filter(|metadata| metadata.level() > Level::Warn)
            .level(level)
            .chain(std::io::stdout())
    }
}

/// Create (or truncate) a log file
fn create_log_file(dir: &Path, file_name: &str) -> Result<File> {
    let path = dir.join(file_name);
    File::create(&path).with_context(|| format!("Could not create log file {}", path.display()))
}

/// Output to the log files in `dir`.
///
/// The run log always includes `info` messages, whatever the console level.
fn file_dispatch(dir: &Path, level: LevelFilter) -> Result<Dispatch> {
    let run_log = Dispatch::new()
        .filter(|metadata| metadata.level() > Level::Warn)
        .level(level.max(LevelFilter::Info))
        .chain(create_log_file(dir, LOG_INFO_FILE_NAME)?);
    let error_log = Dispatch::new()
        .level(LevelFilter::Warn)
        .chain(create_log_file(dir, LOG_ERROR_FILE_NAME)?);

    Ok(Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {message}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target()
            ));
        })
        .chain(run_log)
        .chain(error_log))
}

/// Initialise the program logger.
///
/// This can only succeed once per process.
///
/// # Arguments
///
/// * `log_level_from_settings` - The log level given in `settings.toml`, if any
/// * `log_file_dir` - Where to write log files. If `None`, no log files are written.
pub fn init(log_level_from_settings: Option<&str>, log_file_dir: Option<&Path>) -> Result<()> {
    let from_env = env::var(LOG_LEVEL_ENV_VAR).ok();
    let level = resolve_level(from_env.as_deref(), log_level_from_settings)?;

    let mut dispatch = Dispatch::new()
        .chain(console_dispatch(level, false))
        .chain(console_dispatch(level, true));
    if let Some(dir) = log_file_dir {
        dispatch = dispatch.chain(file_dispatch(dir, level)?);
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}
