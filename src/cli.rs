//! The command line interface for the planner.
use crate::input::{LoadedModel, load_model};
use crate::log;
use crate::model::{Formulation, build_model};
use crate::output::{
    DataWriter, Report, create_output_directory, get_output_dir, write_lp_file, write_sweep,
};
use crate::planner::plan_with_model;
use crate::settings::Settings;
use crate::solver::{HighsSolver, SolverStatus};
use crate::sweep::{check_monotone, sweep_copper_limits};
use crate::units::Fraction;
use ::log::{info, warn};
use anyhow::{Context, Result, ensure};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;

/// The command line interface for the planner.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to write the optimisation model to `model.lp`
    #[arg(long)]
    pub write_lp: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Find the cheapest production plan for a model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Plan once for each of a list of copper limits.
    Sweep {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Copper limits to try, as fractions (e.g. 0.05,0.04,0.03)
        #[arg(long, value_delimiter = ',', required = true)]
        limits: Vec<f64>,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example models.
    Example {
        /// The available subcommands for managing example models.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a model.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Sweep {
                model_dir,
                limits,
                opts,
            } => handle_sweep_command(&model_dir, &limits, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
        }
    }
}

/// Parse CLI arguments and start the planner
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Create the output folder and start the logger.
///
/// # Returns
///
/// The path to the output folder.
fn prepare_output(model_path: &Path, opts: &RunOpts, settings: &Settings) -> Result<PathBuf> {
    let output_path = match &opts.output_dir {
        Some(path) => path.clone(),
        None => get_output_dir(model_path)?,
    };

    let overwrite = create_output_directory(&output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(Some(settings.log_level.as_str()), Some(&output_path))
        .context("Failed to initialise logging.")?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    Ok(output_path)
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = settings_or_load(settings)?;

    // This setting can be overridden by command-line argument
    if opts.write_lp {
        settings.write_lp = true;
    }

    let output_path = prepare_output(model_path, opts, &settings)?;

    let LoadedModel {
        problem,
        build_options,
        solver_config,
    } = load_model(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    let model = build_model(&problem, &build_options).context("Failed to build model.")?;
    if settings.write_lp {
        write_lp_file(&output_path, &model).context("Failed to write LP file.")?;
    }

    let solve_options = solver_config.to_solve_options(settings.verbose_solver);
    let outcome = plan_with_model(&problem, &model, &HighsSolver, &solve_options);

    let mut writer = DataWriter::create(
        &output_path,
        build_options.formulation == Formulation::Disaggregated,
    )?;
    writer.write_outcome(&problem, &outcome)?;
    writer.flush()?;

    if let Some(plan) = &outcome.plan {
        println!("{}", Report::new(&problem, plan));
    }

    ensure!(
        outcome.status == SolverStatus::Optimal,
        "No optimal plan found (solver status: {})",
        outcome.status
    );
    info!("Planning complete!");

    Ok(())
}

/// Handle the `sweep` command.
///
/// The command fails only if no limit gives an optimal plan.
pub fn handle_sweep_command(
    model_path: &Path,
    limits: &[f64],
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = settings_or_load(settings)?;
    let output_path = prepare_output(model_path, opts, &settings)?;

    let model = load_model(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());

    let limits: Vec<Fraction> = limits.iter().copied().map(Fraction).collect();
    let solve_options = model
        .solver_config
        .to_solve_options(settings.verbose_solver);
    let points = sweep_copper_limits(
        &model.problem,
        &model.build_options,
        &limits,
        &HighsSolver,
        &solve_options,
    )
    .context("Failed to run copper limit sweep.")?;
    write_sweep(&output_path, &points)?;

    println!("{:>12} {:>12} {:>14}", "Copper limit", "Status", "Cost");
    for point in &points {
        let cost = point
            .objective
            .map_or_else(|| "-".to_string(), |cost| format!("{:.2}", cost.value()));
        println!(
            "{:>12} {:>12} {:>14}",
            point.limit.value(),
            point.status.to_string(),
            cost
        );
    }

    if !check_monotone(&points) {
        warn!("Costs are not monotone in the copper limit");
    }

    ensure!(
        points
            .iter()
            .any(|point| point.status == SolverStatus::Optimal),
        "No copper limit gave an optimal plan"
    );
    info!("Sweep complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    // Load/validate the model, including the options which are only checked when building
    let model = load_model(model_path).context("Failed to validate model.")?;
    build_model(&model.problem, &model.build_options).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}
