//! Big-M constraints linking a continuous quantity to a binary flag.
use super::{CopperLimit, ModelInstance, Variable};
use crate::error::ValidationError;
use crate::problem::Problem;
use std::fmt;

/// A big-M constant larger than this multiple of the model's natural scale triggers a warning
pub const BIG_M_WARNING_RATIO: f64 = 1e3;

/// Raised when a big-M constant is so large relative to the rest of the model that the solver may
/// struggle with numerical tolerances
#[derive(Debug, Clone, PartialEq)]
pub struct NumericalInstabilityWarning {
    /// The big-M constant in use
    pub big_m: f64,
    /// The largest quantity otherwise present in the model
    pub natural_scale: f64,
    /// The tightest safe constant
    pub recommended: f64,
}

impl fmt::Display for NumericalInstabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "big_m ({}) is more than {} times the scale of the model ({}); \
            consider using {} instead",
            self.big_m, BIG_M_WARNING_RATIO, self.natural_scale, self.recommended
        )
    }
}

/// The big-M constant chosen for a model, plus a warning if it looks dangerous
#[derive(Debug, Clone)]
pub(super) struct BigM {
    pub value: f64,
    pub warning: Option<NumericalInstabilityWarning>,
}

/// Choose the big-M constant for the copper activation constraints.
///
/// The constant must be at least the largest copper mass purchasable in a period, otherwise it
/// could cut off feasible plans. That bound is used when no override is given.
pub(super) fn select_big_m(
    problem: &Problem,
    copper: &CopperLimit,
) -> Result<BigM, ValidationError> {
    let required = problem.max_copper_in_period().value();
    let value = copper.big_m.unwrap_or(required);
    if value < required {
        return Err(ValidationError::BigMTooSmall {
            big_m: value,
            required,
        });
    }

    let natural_scale = problem.natural_scale();
    let warning = (value > BIG_M_WARNING_RATIO * natural_scale.max(1.0)).then_some(
        NumericalInstabilityWarning {
            big_m: value,
            natural_scale,
            recommended: required,
        },
    );

    Ok(BigM { value, warning })
}

/// A constraint `quantity <= bound * flag`.
///
/// When the binary `flag` is zero, `quantity` is forced to be non-positive. When it is one, the
/// constraint is relaxed, provided that `bound` is at least the largest value `quantity` can take.
#[derive(Debug, Clone)]
pub struct ActivationConstraint {
    /// Row name
    pub name: String,
    /// Linear expression for the gated quantity
    pub quantity: Vec<(Variable, f64)>,
    /// Binary variable
    pub flag: Variable,
    /// Big-M constant
    pub bound: f64,
}

impl ActivationConstraint {
    /// Add the constraint to the model as a single row
    pub fn add_to(self, model: &mut ModelInstance) {
        let terms = self
            .quantity
            .into_iter()
            .chain(std::iter::once((self.flag, -self.bound)));
        model.add_row(self.name, ..=0.0, terms);
    }
}

/// Linearisation of `charged = quantity * flag` for binary `flag` and `0 <= quantity <= bound`.
///
/// Adds three rows:
///
/// * `charged <= bound * flag`
/// * `charged <= quantity`
/// * `charged >= quantity - bound * (1 - flag)`
#[derive(Debug, Clone)]
pub struct GatedQuantity {
    /// Prefix for the row names
    pub name: String,
    /// Linear expression for the quantity being gated
    pub quantity: Vec<(Variable, f64)>,
    /// Binary variable
    pub flag: Variable,
    /// Continuous variable equal to `quantity` when `flag` is set and zero otherwise
    pub charged: Variable,
    /// Upper bound on `quantity`
    pub bound: f64,
}

impl GatedQuantity {
    /// Add the three rows to the model
    pub fn add_to(self, model: &mut ModelInstance) {
        let negated = || self.quantity.iter().map(|&(var, coeff)| (var, -coeff));

        model.add_row(
            format!("{}_off", self.name),
            ..=0.0,
            [(self.charged, 1.0), (self.flag, -self.bound)],
        );
        model.add_row(
            format!("{}_upper", self.name),
            ..=0.0,
            std::iter::once((self.charged, 1.0)).chain(negated()),
        );
        model.add_row(
            format!("{}_lower", self.name),
            -self.bound..,
            std::iter::once((self.charged, 1.0))
                .chain(negated())
                .chain(std::iter::once((self.flag, -self.bound))),
        );
    }
}
