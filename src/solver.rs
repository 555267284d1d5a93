//! Solving a [`ModelInstance`] with an external optimisation engine.
//!
//! The [`Solver`] trait is the only seam between the model and a particular engine. The default
//! engine is [HiGHS](https://highs.dev), via the `highs` crate.
use crate::model::{ModelInstance, VariableType};
use highs::{HighsModelStatus, HighsStatus, RowProblem, Sense};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::Display;

/// Options passed to a [`Solver`]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    /// Relative (and absolute) MIP gap at which to stop. Zero means prove optimality.
    pub gap_tolerance: f64,
    /// Give up after this long
    pub time_limit: Option<Duration>,
    /// Whether to let the engine print its own progress output
    pub verbose: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            gap_tolerance: 0.0,
            time_limit: None,
            verbose: false,
        }
    }
}

/// The outcome of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SolverStatus {
    /// An optimal solution was found
    Optimal,
    /// The constraints cannot all be satisfied
    Infeasible,
    /// The objective can be decreased without limit
    Unbounded,
    /// The time limit was reached before optimality was proven
    Timeout,
    /// Anything else
    Error,
}

/// The raw result of a solve, before it is interpreted as a plan
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    /// How the solve ended
    pub status: SolverStatus,
    /// The objective value, if optimal
    pub objective_value: Option<f64>,
    /// One value per column of the model, if optimal (otherwise empty)
    pub column_values: Vec<f64>,
}

impl RawSolution {
    /// A result with no solution values
    pub fn without_solution(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            column_values: Vec::new(),
        }
    }
}

/// An optimisation engine
pub trait Solver {
    /// Solve the model.
    ///
    /// Failures inside the engine are reported through [`RawSolution::status`] rather than as
    /// errors.
    fn solve(&self, model: &ModelInstance, options: &SolveOptions) -> RawSolution;
}

/// Solves models with HiGHS
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver;

/// Translate the model into a HiGHS problem and solve it once.
///
/// # Returns
///
/// The model status and, if optimal, the column values. An error is returned if HiGHS itself
/// failed (e.g. because the problem was rejected).
fn run_highs(
    model: &ModelInstance,
    options: &SolveOptions,
    presolve: bool,
) -> Result<(HighsModelStatus, Vec<f64>), HighsStatus> {
    let mut problem = RowProblem::default();

    let cols: Vec<_> = model
        .columns()
        .iter()
        .map(|col| match col.kind {
            VariableType::Continuous => problem.add_column(col.cost, col.lower..=col.upper),
            VariableType::Binary => problem.add_integer_column(col.cost, col.lower..=col.upper),
        })
        .collect();

    for row in model.rows() {
        let terms = row
            .terms
            .iter()
            .map(|&(var, coeff)| (cols[var.index()], coeff));
        problem.add_row(row.lower..=row.upper, terms);
    }

    let mut highs_model = problem.optimise(Sense::Minimise);
    highs_model.set_option("output_flag", options.verbose);
    highs_model.set_option("log_to_console", options.verbose);
    highs_model.set_option("presolve", if presolve { "choose" } else { "off" });
    highs_model.set_option("mip_rel_gap", options.gap_tolerance);
    highs_model.set_option("mip_abs_gap", options.gap_tolerance);
    if let Some(time_limit) = options.time_limit {
        highs_model.set_option("time_limit", time_limit.as_secs_f64());
    }

    let solved = highs_model.try_solve()?;
    let status = solved.status();
    let values = if status == HighsModelStatus::Optimal {
        solved.get_solution().columns().to_vec()
    } else {
        Vec::new()
    };

    Ok((status, values))
}

/// Map a HiGHS status onto a [`SolverStatus`]
fn convert_status(status: HighsModelStatus) -> SolverStatus {
    match status {
        HighsModelStatus::Optimal => SolverStatus::Optimal,
        HighsModelStatus::Infeasible => SolverStatus::Infeasible,
        HighsModelStatus::Unbounded => SolverStatus::Unbounded,
        HighsModelStatus::ReachedTimeLimit => SolverStatus::Timeout,
        status => {
            warn!("HiGHS finished with unexpected status: {status:?}");
            SolverStatus::Error
        }
    }
}

/// Work out the final status of a solve.
///
/// If HiGHS could not tell infeasibility from unboundedness even without presolve, the model is
/// infeasible when no column can decrease without limit.
///
/// # Arguments
///
/// * `result` - The model status, or the HiGHS error if the solve failed
/// * `bounded_below` - Whether every column of the model has a finite lower bound
fn final_status(
    result: Result<HighsModelStatus, HighsStatus>,
    bounded_below: bool,
) -> SolverStatus {
    match result {
        Err(status) => {
            warn!("HiGHS failed to solve the model: {status:?}");
            SolverStatus::Error
        }
        Ok(HighsModelStatus::UnboundedOrInfeasible) if bounded_below => SolverStatus::Infeasible,
        Ok(HighsModelStatus::UnboundedOrInfeasible) => SolverStatus::Error,
        Ok(status) => convert_status(status),
    }
}

impl Solver for HighsSolver {
    fn solve(&self, model: &ModelInstance, options: &SolveOptions) -> RawSolution {
        let mut result = run_highs(model, options, true);

        // Presolve can't always tell infeasibility from unboundedness
        if matches!(result, Ok((HighsModelStatus::UnboundedOrInfeasible, _))) {
            debug!("HiGHS reported infeasible or unbounded; solving again without presolve");
            result = run_highs(model, options, false);
        }

        let (result, values) = match result {
            Ok((status, values)) => (Ok(status), values),
            Err(status) => (Err(status), Vec::new()),
        };
        let status = final_status(result, model.is_bounded_below());
        if status != SolverStatus::Optimal {
            return RawSolution::without_solution(status);
        }

        RawSolution {
            status,
            objective_value: Some(model.objective_value(&values)),
            column_values: values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::copper_problem;
    use crate::model::{BuildOptions, build_model};
    use crate::problem::Problem;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[test]
    fn test_status_display() {
        assert_eq!(SolverStatus::Optimal.to_string(), "OPTIMAL");
        assert_eq!(SolverStatus::Timeout.to_string(), "TIMEOUT");
    }

    #[rstest]
    fn test_highs_optimal(copper_problem: Problem) {
        let model = build_model(&copper_problem, &BuildOptions::default()).unwrap();
        let solution = HighsSolver.solve(&model, &SolveOptions::default());
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.column_values.len(), model.columns().len());

        // All 10 kg from the cheap supplier
        assert_approx_eq!(
            f64,
            solution.objective_value.unwrap(),
            50.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_convert_status() {
        assert_eq!(
            convert_status(HighsModelStatus::ReachedTimeLimit),
            SolverStatus::Timeout
        );
        assert_eq!(
            convert_status(HighsModelStatus::ModelError),
            SolverStatus::Error
        );
    }

    #[rstest]
    #[case(Err(HighsStatus::Error), true, SolverStatus::Error)]
    #[case(Err(HighsStatus::Error), false, SolverStatus::Error)]
    #[case(Ok(HighsModelStatus::Optimal), true, SolverStatus::Optimal)]
    #[case(Ok(HighsModelStatus::UnboundedOrInfeasible), true, SolverStatus::Infeasible)]
    #[case(Ok(HighsModelStatus::UnboundedOrInfeasible), false, SolverStatus::Error)]
    #[case(Ok(HighsModelStatus::Infeasible), true, SolverStatus::Infeasible)]
    fn test_final_status(
        #[case] result: Result<HighsModelStatus, HighsStatus>,
        #[case] bounded_below: bool,
        #[case] expected: SolverStatus,
    ) {
        assert_eq!(final_status(result, bounded_below), expected);
    }
}
