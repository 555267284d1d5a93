//! Interpreting solver output as a production plan.
use crate::id::{ProductID, SupplierID};
use crate::model::{Formulation, ModelInstance, Variable};
use crate::problem::{Period, Problem};
use crate::units::{Mass, Money};
use indexmap::IndexMap;
use itertools::iproduct;

/// Binary variables above this value are treated as set
const BINARY_THRESHOLD: f64 = 0.5;

/// Use of electrolysis in a single period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectrolysisUse {
    /// Whether electrolysis is used
    pub active: bool,
    /// Copper mass charged the variable cost (zero when inactive)
    pub charged_copper: Mass,
    /// Fixed plus variable cost incurred
    pub cost: Money,
}

/// How the objective splits into its components
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    /// Cost of buying scrap
    pub purchase: Money,
    /// Cost of holding stock
    pub holding: Money,
    /// Cost of electrolysis
    pub electrolysis: Money,
}

impl CostBreakdown {
    /// The sum of all costs
    pub fn total(&self) -> Money {
        self.purchase + self.holding + self.electrolysis
    }
}

/// An optimal production plan
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionPlan {
    /// Objective value of the solution
    pub objective: Money,
    /// The objective split into its components
    pub costs: CostBreakdown,
    /// Scrap bought from each supplier in each period
    pub purchases: IndexMap<(SupplierID, Period), Mass>,
    /// Scrap bought from each supplier for each product in each period.
    ///
    /// Only available for the disaggregated formulation.
    pub allocations: Option<IndexMap<(SupplierID, ProductID, Period), Mass>>,
    /// Steel produced
    pub production: IndexMap<(ProductID, Period), Mass>,
    /// Stock held at the end of each period
    pub inventory: IndexMap<(ProductID, Period), Mass>,
    /// Copper mass in each period's purchases
    pub copper: IndexMap<Period, Mass>,
    /// Electrolysis decisions, if electrolysis was modelled
    pub electrolysis: IndexMap<Period, ElectrolysisUse>,
}

impl ProductionPlan {
    /// Build a plan from the column values of an optimal solution.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem which was solved
    /// * `model` - The model built from `problem`
    /// * `values` - One value per column of `model`
    pub fn from_columns(problem: &Problem, model: &ModelInstance, values: &[f64]) -> Self {
        assert_eq!(
            values.len(),
            model.columns().len(),
            "Solution does not match model"
        );

        let value = |var: Variable| values[var.index()];
        let cost = |var: Variable| model.columns()[var.index()].cost * values[var.index()];
        let vars = model.variables();

        let allocations = (model.formulation() == Formulation::Disaggregated).then(|| {
            vars.allocation_vars
                .iter()
                .map(|(key, var)| (key.clone(), Mass(value(*var))))
                .collect::<IndexMap<_, _>>()
        });

        let purchases: IndexMap<_, _> = iproduct!(problem.suppliers(), problem.periods())
            .map(|(supplier, t)| {
                let bought = match &allocations {
                    Some(allocations) => problem
                        .products()
                        .iter()
                        .map(|p| allocations[&(supplier.id.clone(), p.id.clone(), t)])
                        .sum::<Mass>(),
                    None => Mass(value(vars.purchase_vars[&(supplier.id.clone(), t)])),
                };
                ((supplier.id.clone(), t), bought)
            })
            .collect();

        let to_masses = |map: &IndexMap<(ProductID, Period), Variable>| {
            map.iter()
                .map(|(key, var)| (key.clone(), Mass(value(*var))))
                .collect::<IndexMap<_, _>>()
        };
        let production = to_masses(&vars.production_vars);
        let inventory = to_masses(&vars.inventory_vars);

        let copper: IndexMap<_, _> = problem
            .periods()
            .map(|t| {
                let mass: Mass = problem
                    .suppliers()
                    .iter()
                    .map(|s| s.copper * purchases[&(s.id.clone(), t)])
                    .sum();
                (t, mass)
            })
            .collect();

        let electrolysis: IndexMap<_, _> = vars
            .electrolysis_vars
            .iter()
            .map(|(&t, &flag)| {
                let charged = vars.charged_copper_vars[&t];
                let usage = ElectrolysisUse {
                    active: value(flag) > BINARY_THRESHOLD,
                    charged_copper: Mass(value(charged)),
                    cost: Money(cost(flag) + cost(charged)),
                };
                (t, usage)
            })
            .collect();

        let costs = CostBreakdown {
            purchase: iproduct!(problem.suppliers(), problem.periods())
                .map(|(s, t)| s.cost * purchases[&(s.id.clone(), t)])
                .sum(),
            holding: vars.inventory_vars.values().map(|var| Money(cost(*var))).sum(),
            electrolysis: electrolysis.values().map(|usage| usage.cost).sum(),
        };

        Self {
            objective: Money(model.objective_value(values)),
            costs,
            purchases,
            allocations,
            production,
            inventory,
            copper,
            electrolysis,
        }
    }

    /// Total production in a period
    pub fn total_production(&self, period: Period) -> Mass {
        self.production
            .iter()
            .filter(|((_, t), _)| *t == period)
            .map(|(_, mass)| *mass)
            .sum()
    }

    /// Total scrap bought in a period
    pub fn total_purchases(&self, period: Period) -> Mass {
        self.purchases
            .iter()
            .filter(|((_, t), _)| *t == period)
            .map(|(_, mass)| *mass)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::copper_problem;
    use crate::model::{BuildOptions, CopperLimit, Electrolysis, build_model};
    use crate::units::{Fraction, MoneyPerMass};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_from_columns(copper_problem: Problem) {
        let model = build_model(&copper_problem, &BuildOptions::default()).unwrap();

        // Columns: buy[clean,plain,Jan], buy[dirty,plain,Jan], make[plain,Jan], stock[plain,Jan]
        let plan = ProductionPlan::from_columns(&copper_problem, &model, &[4.0, 6.0, 10.0, 0.0]);
        assert_approx_eq!(f64, plan.objective.value(), 70.0);
        assert_approx_eq!(f64, plan.costs.purchase.value(), 70.0);
        assert_approx_eq!(f64, plan.costs.holding.value(), 0.0);
        assert_approx_eq!(f64, plan.costs.total().value(), 70.0);
        assert_eq!(plan.purchases[&(SupplierID::new("dirty"), 0)], Mass(6.0));
        assert_eq!(
            plan.allocations.as_ref().unwrap()[&(SupplierID::new("clean"), ProductID::new("plain"), 0)],
            Mass(4.0)
        );
        assert_approx_eq!(f64, plan.copper[0].value(), 0.3);
        assert_eq!(plan.total_production(0), Mass(10.0));
        assert_eq!(plan.total_purchases(0), Mass(10.0));
        assert!(plan.electrolysis.is_empty());
    }

    #[rstest]
    fn test_from_columns_with_electrolysis(copper_problem: Problem) {
        let options = BuildOptions {
            copper: Some(CopperLimit {
                limit: Fraction(0.02),
                electrolysis: Some(Electrolysis {
                    fixed_cost: Money(100.0),
                    variable_cost: MoneyPerMass(5.0),
                    removes_copper: false,
                }),
                big_m: None,
            }),
            ..BuildOptions::default()
        };
        let model = build_model(&copper_problem, &options).unwrap();

        // ... plus electrolysis[Jan], charged_copper[Jan]
        let values = [0.0, 10.0, 10.0, 0.0, 1.0, 0.5];
        let plan = ProductionPlan::from_columns(&copper_problem, &model, &values);
        let usage = plan.electrolysis[0];
        assert!(usage.active);
        assert_approx_eq!(f64, usage.charged_copper.value(), 0.5);
        assert_approx_eq!(f64, usage.cost.value(), 102.5);
        assert_approx_eq!(f64, plan.objective.value(), 152.5);
        assert_approx_eq!(f64, plan.costs.total().value(), 152.5);
    }
}
