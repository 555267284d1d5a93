//! Code for building the blending and lot-sizing optimisation problem.
//!
//! [`build_model`] translates a [`Problem`] into a [`ModelInstance`]: a self-contained description
//! of the decision variables (columns), the constraints (rows) and the objective. The instance
//! knows nothing about any particular solver; see [`crate::solver`] for that.
//!
//! Every call to [`build_model`] produces a fresh instance. Nothing is shared between instances, so
//! a model built for one scenario can never leak variables or constraints into another.
use crate::error::{BlendResult, InfeasibleSpecError};
use crate::id::{ProductID, SupplierID};
use crate::problem::{Period, Problem};
use indexmap::IndexMap;
use log::{debug, warn};
use std::ops::{Bound, RangeBounds};

mod activation;
mod constraints;
mod lp_format;
mod options;
mod variables;
pub use activation::{
    ActivationConstraint, BIG_M_WARNING_RATIO, GatedQuantity, NumericalInstabilityWarning,
};
pub use options::{BuildOptions, CompositionPolicy, CopperLimit, Electrolysis, Formulation};

/// A decision variable in the optimisation.
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the [`ModelInstance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(usize);

impl Variable {
    /// The index of the variable's column in the model
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether a variable may take any value within its bounds or only zero and one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableType {
    /// A non-integer variable
    Continuous,
    /// A variable restricted to zero or one
    Binary,
}

/// A column of the optimisation problem
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Human-readable name, used when exporting the model
    pub name: String,
    /// Coefficient of the variable in the (minimised) objective
    pub cost: f64,
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
    /// Continuous or binary
    pub kind: VariableType,
}

/// A constraint of the form `lower <= a1*x1 + a2*x2 + ... <= upper`.
///
/// Often, constraints will impose only a lower or an upper value, with the other set to infinity
/// or minus infinity.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// Human-readable name, used when exporting the model
    pub name: String,
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
    /// Coefficients for the variables in the constraint
    pub terms: Vec<(Variable, f64)>,
}

/// A map for easy lookup of variables in the problem.
///
/// There is one map per index space, so a key for one kind of variable can never be confused with
/// a key for another. The entries are ordered (see [`IndexMap`]), in the same order in which the
/// variables were added.
#[derive(Default, Debug)]
pub struct VariableMap {
    /// Scrap bought from a supplier in a period (aggregated formulation only)
    pub purchase_vars: IndexMap<(SupplierID, Period), Variable>,
    /// Scrap bought from a supplier in a period for a specific product (disaggregated only)
    pub allocation_vars: IndexMap<(SupplierID, ProductID, Period), Variable>,
    /// Steel produced in a period
    pub production_vars: IndexMap<(ProductID, Period), Variable>,
    /// Stock held at the end of a period
    pub inventory_vars: IndexMap<(ProductID, Period), Variable>,
    /// Whether electrolysis is used in a period
    pub electrolysis_vars: IndexMap<Period, Variable>,
    /// Copper mass charged for electrolysis in a period (zero when electrolysis is not used)
    pub charged_copper_vars: IndexMap<Period, Variable>,
    /// Copper removed from each product's melt by electrolysis (disaggregated formulation with
    /// copper removal only)
    pub removed_copper_vars: IndexMap<(ProductID, Period), Variable>,
}

impl VariableMap {
    /// Get the production variable for the given product and period
    pub fn production(&self, product_id: &ProductID, period: Period) -> Variable {
        *self
            .production_vars
            .get(&(product_id.clone(), period))
            .expect("No production variable found for given params")
    }

    /// Get the inventory variable for the given product and period
    pub fn inventory(&self, product_id: &ProductID, period: Period) -> Variable {
        *self
            .inventory_vars
            .get(&(product_id.clone(), period))
            .expect("No inventory variable found for given params")
    }

    /// Get the allocation variable for the given supplier, product and period
    pub fn allocation(
        &self,
        supplier_id: &SupplierID,
        product_id: &ProductID,
        period: Period,
    ) -> Variable {
        *self
            .allocation_vars
            .get(&(supplier_id.clone(), product_id.clone(), period))
            .expect("No allocation variable found for given params")
    }

    /// Get the variables which together measure how much scrap is bought from a supplier in a
    /// period.
    ///
    /// For the aggregated formulation this is a single variable; for the disaggregated formulation
    /// there is one variable per product.
    pub fn purchase_terms(
        &self,
        supplier_id: &SupplierID,
        product_ids: &[ProductID],
        period: Period,
    ) -> Vec<Variable> {
        if let Some(var) = self.purchase_vars.get(&(supplier_id.clone(), period)) {
            return vec![*var];
        }

        product_ids
            .iter()
            .map(|product_id| self.allocation(supplier_id, product_id, period))
            .collect()
    }
}

/// A complete, solver-independent description of an optimisation problem
#[derive(Debug)]
pub struct ModelInstance {
    formulation: Formulation,
    columns: Vec<Column>,
    rows: Vec<Row>,
    variables: VariableMap,
    warnings: Vec<NumericalInstabilityWarning>,
}

/// Convert a range into a pair of lower and upper bounds, using infinities for open ends
fn bounds_to_pair<B: RangeBounds<f64>>(bounds: &B) -> (f64, f64) {
    let lower = match bounds.start_bound() {
        Bound::Included(x) | Bound::Excluded(x) => *x,
        Bound::Unbounded => f64::NEG_INFINITY,
    };
    let upper = match bounds.end_bound() {
        Bound::Included(x) | Bound::Excluded(x) => *x,
        Bound::Unbounded => f64::INFINITY,
    };

    (lower, upper)
}

impl ModelInstance {
    /// Create an empty model
    fn new(formulation: Formulation) -> Self {
        Self {
            formulation,
            columns: Vec::new(),
            rows: Vec::new(),
            variables: VariableMap::default(),
            warnings: Vec::new(),
        }
    }

    /// Add a column to the problem, returning the new variable
    fn add_column<B: RangeBounds<f64>>(
        &mut self,
        name: String,
        cost: f64,
        bounds: B,
        kind: VariableType,
    ) -> Variable {
        let (lower, upper) = bounds_to_pair(&bounds);
        self.columns.push(Column {
            name,
            cost,
            lower,
            upper,
            kind,
        });

        Variable(self.columns.len() - 1)
    }

    /// Add a row to the problem
    fn add_row<B, I>(&mut self, name: String, bounds: B, terms: I)
    where
        B: RangeBounds<f64>,
        I: IntoIterator<Item = (Variable, f64)>,
    {
        let (lower, upper) = bounds_to_pair(&bounds);
        self.rows.push(Row {
            name,
            lower,
            upper,
            terms: terms.into_iter().collect(),
        });
    }

    /// The formulation used to build the model
    pub fn formulation(&self) -> Formulation {
        self.formulation
    }

    /// The columns of the problem, indexed by [`Variable::index`]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The rows of the problem
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The variables of the problem, keyed by what they represent
    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    /// Warnings raised while building the model
    pub fn warnings(&self) -> &[NumericalInstabilityWarning] {
        &self.warnings
    }

    /// Whether any of the variables are binary
    pub fn is_mip(&self) -> bool {
        self.columns.iter().any(|col| col.kind == VariableType::Binary)
    }

    /// Whether the objective is bounded below by construction.
    ///
    /// This holds when every variable is non-negative and has a non-negative cost, in which case
    /// the objective can never be less than zero and the model cannot be unbounded.
    pub fn is_bounded_below(&self) -> bool {
        self.columns
            .iter()
            .all(|col| col.lower >= 0.0 && col.cost >= 0.0)
    }

    /// Evaluate the objective for the given column values
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "Wrong number of values for objective"
        );

        self.columns
            .iter()
            .zip(values)
            .map(|(col, value)| col.cost * value)
            .sum()
    }
}

/// Check for structural contradictions which make solving pointless
fn check_structure(problem: &Problem) -> Result<(), InfeasibleSpecError> {
    if problem.num_periods() == 0 {
        return Err(InfeasibleSpecError::NoPeriods);
    }
    if problem.suppliers().is_empty() {
        return Err(InfeasibleSpecError::NoSuppliers);
    }
    if problem.products().is_empty() {
        return Err(InfeasibleSpecError::NoProducts);
    }

    Ok(())
}

/// Build the optimisation model for a problem.
///
/// The objective is to minimise the cost of buying scrap and holding stock, plus the cost of
/// electrolysis when a copper limit with electrolysis is configured.
///
/// # Arguments
///
/// * `problem` - The validated problem data
/// * `options` - Which formulation, composition policy and copper limit to use
///
/// # Returns
///
/// A new [`ModelInstance`], or an error if the options are invalid or the problem is degenerate.
/// Whether the model has a feasible solution is only known once it has been solved.
pub fn build_model(problem: &Problem, options: &BuildOptions) -> BlendResult<ModelInstance> {
    check_structure(problem)?;
    options.validate()?;

    let big_m = match &options.copper {
        Some(copper) if copper.electrolysis.is_some() => {
            Some(activation::select_big_m(problem, copper)?)
        }
        _ => None,
    };

    let mut model = ModelInstance::new(options.formulation);
    if let Some(warning) = big_m.as_ref().and_then(|m| m.warning.clone()) {
        warn!("{warning}");
        model.warnings.push(warning);
    }

    model.variables = variables::add_variables(&mut model, problem, options);
    constraints::add_constraints(&mut model, problem, options, big_m.map(|m| m.value));

    debug!(
        "Built {} model with {} columns and {} rows",
        model.formulation,
        model.columns.len(),
        model.rows.len()
    );

    Ok(model)
}
