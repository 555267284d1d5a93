//! The end-to-end planning pipeline: build, solve and interpret.
use crate::error::BlendResult;
use crate::model::{BuildOptions, ModelInstance, NumericalInstabilityWarning, build_model};
use crate::problem::Problem;
use crate::solution::ProductionPlan;
use crate::solver::{SolveOptions, Solver, SolverStatus};
use crate::units::Money;
use log::{info, warn};

/// The result of a planning attempt which got as far as the solver
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    /// How the solve ended
    pub status: SolverStatus,
    /// The optimal plan, only present if `status` is [`SolverStatus::Optimal`]
    pub plan: Option<ProductionPlan>,
    /// Warnings raised while building the model
    pub warnings: Vec<NumericalInstabilityWarning>,
}

impl PlanOutcome {
    /// The objective value, if an optimal plan was found
    pub fn objective(&self) -> Option<Money> {
        self.plan.as_ref().map(|plan| plan.objective)
    }
}

/// Find the cheapest production plan for a problem.
///
/// A fresh model is built for every call, so repeated calls with different options are
/// independent.
///
/// # Arguments
///
/// * `problem` - The problem data
/// * `build_options` - How to build the model
/// * `solver` - The optimisation engine to use
/// * `solve_options` - Options for the engine
///
/// # Returns
///
/// A [`PlanOutcome`], or an error if the model could not be built. An infeasible model is not an
/// error.
pub fn plan<S: Solver + ?Sized>(
    problem: &Problem,
    build_options: &BuildOptions,
    solver: &S,
    solve_options: &SolveOptions,
) -> BlendResult<PlanOutcome> {
    let model = build_model(problem, build_options)?;
    Ok(plan_with_model(problem, &model, solver, solve_options))
}

/// Solve a model which has already been built and interpret the result.
///
/// This lets the caller use the model for other things too (e.g. writing it to an LP file)
/// without building it twice.
///
/// # Arguments
///
/// * `problem` - The problem data the model was built from
/// * `model` - The model, as returned by [`build_model`]
/// * `solver` - The optimisation engine to use
/// * `solve_options` - Options for the engine
pub fn plan_with_model<S: Solver + ?Sized>(
    problem: &Problem,
    model: &ModelInstance,
    solver: &S,
    solve_options: &SolveOptions,
) -> PlanOutcome {
    let solution = solver.solve(model, solve_options);

    let plan = match solution.status {
        SolverStatus::Optimal => {
            let plan = ProductionPlan::from_columns(problem, model, &solution.column_values);
            info!("Found optimal plan with cost {}", plan.objective);
            Some(plan)
        }
        status => {
            warn!("No optimal plan found: solver status is {status}");
            None
        }
    };

    PlanOutcome {
        status: solution.status,
        plan,
        warnings: model.warnings().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{copper_problem, copper_tables, stainless_problem};
    use crate::id::ProductID;
    use crate::model::{CompositionPolicy, CopperLimit, Electrolysis, Formulation};
    use crate::problem::ProblemTables;
    use crate::solver::{HighsSolver, RawSolution};
    use crate::units::{Fraction, MoneyPerMass};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    /// A solver which always gives up
    struct GiveUp;

    impl Solver for GiveUp {
        fn solve(&self, _model: &ModelInstance, _options: &SolveOptions) -> RawSolution {
            RawSolution::without_solution(SolverStatus::Timeout)
        }
    }

    fn solve(problem: &Problem, options: &BuildOptions) -> PlanOutcome {
        plan(problem, options, &HighsSolver, &SolveOptions::default()).unwrap()
    }

    fn electrolysis(fixed_cost: f64, variable_cost: f64) -> BuildOptions {
        BuildOptions {
            copper: Some(CopperLimit {
                limit: Fraction(0.02),
                electrolysis: Some(Electrolysis {
                    fixed_cost: Money(fixed_cost),
                    variable_cost: MoneyPerMass(variable_cost),
                    removes_copper: false,
                }),
                big_m: None,
            }),
            ..BuildOptions::default()
        }
    }

    #[rstest]
    fn test_plan_meets_demand(stainless_problem: Problem) {
        let outcome = solve(&stainless_problem, &BuildOptions::default());
        assert_eq!(outcome.status, SolverStatus::Optimal);
        let plan = outcome.plan.unwrap();

        // With a single period everything is made to order
        for (j, product) in stainless_problem.products().iter().enumerate() {
            let made = plan.production[&(product.id.clone(), 0)];
            assert_approx_eq!(
                f64,
                made.value(),
                stainless_problem.demand(j, 0).value(),
                epsilon = 1e-6
            );
            assert_approx_eq!(
                f64,
                plan.inventory[&(product.id.clone(), 0)].value(),
                0.0,
                epsilon = 1e-6
            );
        }
        assert_approx_eq!(
            f64,
            plan.objective.value(),
            plan.costs.total().value(),
            epsilon = 1e-6
        );
    }

    #[rstest]
    #[case(0.05, 50.0)]
    #[case(0.04, 60.0)]
    #[case(0.02, 80.0)]
    #[case(0.0, 100.0)]
    fn test_hard_copper_limit(
        copper_problem: Problem,
        #[case] limit: f64,
        #[case] expected: f64,
    ) {
        let options = BuildOptions::default().with_copper_limit(Fraction(limit));
        let outcome = solve(&copper_problem, &options);
        assert_approx_eq!(
            f64,
            outcome.objective().unwrap().value(),
            expected,
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn test_electrolysis_not_worth_it(copper_problem: Problem) {
        let outcome = solve(&copper_problem, &electrolysis(100.0, 5.0));
        let plan = outcome.plan.unwrap();
        assert_approx_eq!(f64, plan.objective.value(), 80.0, epsilon = 1e-6);
        assert!(!plan.electrolysis[0].active);
        assert_approx_eq!(f64, plan.costs.electrolysis.value(), 0.0, epsilon = 1e-6);
    }

    #[rstest]
    fn test_electrolysis_worth_it(copper_problem: Problem) {
        // Buying only from "dirty" costs 50 plus 5 * 0.5 for electrolysis
        let outcome = solve(&copper_problem, &electrolysis(0.0, 5.0));
        let plan = outcome.plan.unwrap();
        assert_approx_eq!(f64, plan.objective.value(), 52.5, epsilon = 1e-6);
        let usage = plan.electrolysis[0];
        assert!(usage.active);
        assert_approx_eq!(f64, usage.charged_copper.value(), 0.5, epsilon = 1e-6);
        assert_approx_eq!(f64, plan.copper[0].value(), 0.5, epsilon = 1e-6);
    }

    #[rstest]
    fn test_electrolysis_removes_copper(copper_problem: Problem) {
        let mut options = electrolysis(0.0, 5.0);
        if let Some(electrolysis) = options
            .copper
            .as_mut()
            .and_then(|copper| copper.electrolysis.as_mut())
        {
            electrolysis.removes_copper = true;
        }

        // 5% of the dirty scrap is lost, so 10 / 0.95 kg must be bought to make 10 kg of steel
        let outcome = solve(&copper_problem, &options);
        let plan = outcome.plan.unwrap();
        let bought = 10.0 / 0.95;
        assert!(plan.electrolysis[0].active);
        assert_approx_eq!(f64, plan.total_purchases(0).value(), bought, epsilon = 1e-6);
        assert_approx_eq!(f64, plan.total_production(0).value(), 10.0, epsilon = 1e-6);
        assert_approx_eq!(
            f64,
            plan.electrolysis[0].charged_copper.value(),
            0.05 * bought,
            epsilon = 1e-6
        );
        assert_approx_eq!(f64, plan.objective.value(), 5.25 * bought, epsilon = 1e-6);
    }

    #[rstest]
    #[case(Formulation::Aggregated)]
    #[case(Formulation::Disaggregated)]
    fn test_plan_with_model_matches_plan(
        stainless_problem: Problem,
        #[case] formulation: Formulation,
    ) {
        let options = BuildOptions {
            formulation,
            ..electrolysis(100.0, 5.0)
        };
        let expected = solve(&stainless_problem, &options);

        let model = build_model(&stainless_problem, &options).unwrap();
        let outcome = plan_with_model(
            &stainless_problem,
            &model,
            &HighsSolver,
            &SolveOptions::default(),
        );
        assert_eq!(outcome.status, expected.status);
        assert_approx_eq!(
            f64,
            outcome.objective().unwrap().value(),
            expected.objective().unwrap().value(),
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn test_holding_stock(copper_tables: ProblemTables) {
        // Demand in the second period exceeds plant capacity, so stock must be built up first
        let tables = ProblemTables {
            demand: vec![vec![10.0], vec![150.0]],
            period_labels: None,
            ..copper_tables
        };
        let problem = Problem::from_tables(tables).unwrap();
        let plan = solve(&problem, &BuildOptions::default()).plan.unwrap();
        assert_approx_eq!(
            f64,
            plan.inventory[&(ProductID::new("plain"), 0)].value(),
            50.0,
            epsilon = 1e-6
        );
        assert_approx_eq!(
            f64,
            plan.total_production(1).value(),
            100.0,
            epsilon = 1e-6
        );

        // 160 kg from "dirty" plus holding 50 kg for one period
        assert_approx_eq!(f64, plan.objective.value(), 850.0, epsilon = 1e-6);
    }

    #[rstest]
    fn test_infeasible(copper_tables: ProblemTables) {
        let tables = ProblemTables {
            supplier_capacities: vec![0.0, 0.0],
            ..copper_tables
        };
        let problem = Problem::from_tables(tables).unwrap();
        let outcome = solve(&problem, &BuildOptions::default());
        assert_eq!(outcome.status, SolverStatus::Infeasible);
        assert!(outcome.plan.is_none());
        assert!(outcome.objective().is_none());
    }

    #[rstest]
    fn test_solver_failure_is_not_an_error(stainless_problem: Problem) {
        let outcome = plan(
            &stainless_problem,
            &BuildOptions::default(),
            &GiveUp,
            &SolveOptions::default(),
        )
        .unwrap();
        assert_eq!(outcome.status, SolverStatus::Timeout);
        assert!(outcome.plan.is_none());
    }

    #[rstest]
    fn test_relaxations_are_no_more_expensive(stainless_problem: Problem) {
        let objective = |options: BuildOptions| {
            solve(&stainless_problem, &options)
                .objective()
                .unwrap()
                .value()
        };

        let exact = objective(BuildOptions::default());
        let aggregated = objective(BuildOptions {
            formulation: Formulation::Aggregated,
            ..BuildOptions::default()
        });
        let at_most = objective(BuildOptions {
            composition: CompositionPolicy::AtMost,
            ..BuildOptions::default()
        });

        assert!(aggregated <= exact + 1e-6);
        assert!(at_most <= exact + 1e-6);
    }
}
