//! Sensitivity analysis over the copper limit.
use crate::error::BlendResult;
use crate::model::BuildOptions;
use crate::planner::plan;
use crate::problem::Problem;
use crate::solver::{SolveOptions, Solver, SolverStatus};
use crate::units::{Fraction, Money};
use log::{info, warn};

/// Tolerance used when checking that costs don't fall as the limit tightens
const MONOTONICITY_TOLERANCE: f64 = 1e-6;

/// The result of planning with one copper limit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    /// The copper limit used
    pub limit: Fraction,
    /// How the solve ended
    pub status: SolverStatus,
    /// The optimal cost, if one was found
    pub objective: Option<Money>,
}

/// Plan once for each copper limit.
///
/// Each limit gets its own freshly built model; all other options are taken from `base_options`.
/// If `base_options` has no copper limit, the limits are hard ones.
///
/// # Arguments
///
/// * `problem` - The problem data
/// * `base_options` - Options shared by all runs
/// * `limits` - Copper limits to try, in the order given
/// * `solver` - The optimisation engine
/// * `solve_options` - Options for the engine
pub fn sweep_copper_limits<S: Solver + ?Sized>(
    problem: &Problem,
    base_options: &BuildOptions,
    limits: &[Fraction],
    solver: &S,
    solve_options: &SolveOptions,
) -> BlendResult<Vec<SweepPoint>> {
    let mut points = Vec::with_capacity(limits.len());
    for &limit in limits {
        info!("Planning with copper limit {limit}");
        let options = base_options.with_copper_limit(limit);
        let outcome = plan(problem, &options, solver, solve_options)?;
        points.push(SweepPoint {
            limit,
            status: outcome.status,
            objective: outcome.objective(),
        });
    }

    Ok(points)
}

/// Check that the optimal cost never decreases as the copper limit tightens.
///
/// Points without an optimal cost are ignored. Any violation is logged.
///
/// # Returns
///
/// Whether the costs are monotone.
pub fn check_monotone(points: &[SweepPoint]) -> bool {
    let mut solved: Vec<_> = points
        .iter()
        .filter_map(|point| point.objective.map(|objective| (point.limit, objective)))
        .collect();
    solved.sort_by(|a, b| a.0.value().total_cmp(&b.0.value()));

    let mut monotone = true;
    for pair in solved.windows(2) {
        let ((tight, tight_cost), (loose, loose_cost)) = (pair[0], pair[1]);
        if tight_cost.value() + MONOTONICITY_TOLERANCE < loose_cost.value() {
            warn!(
                "Cost with copper limit {tight} ({tight_cost}) is lower than with the looser \
                limit {loose} ({loose_cost})"
            );
            monotone = false;
        }
    }

    monotone
}
