//! Error types for the planning library.
//!
//! Errors fall into two groups: problems with the input data, which are detected before a model is
//! built ([`ValidationError`]), and structural contradictions which make it pointless to build a
//! model at all ([`InfeasibleSpecError`]). An infeasible or unbounded model is *not* an error; it
//! is reported as a [`SolverStatus`](crate::solver::SolverStatus).
use thiserror::Error;

/// Malformed or inconsistent input data
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A table has the wrong number of entries
    #[error("{table} has {actual} entries, expected {expected}")]
    ShapeMismatch {
        /// Name of the offending table
        table: String,
        /// Expected number of entries
        expected: usize,
        /// Actual number of entries
        actual: usize,
    },
    /// A fraction lies outside [0, 1]
    #[error("{field} for {id} must be between 0 and 1 (got {value})")]
    FractionOutOfRange {
        /// Name of the offending field
        field: String,
        /// ID of the entity the value belongs to
        id: String,
        /// The invalid value
        value: f64,
    },
    /// A cost, capacity or demand is negative
    #[error("{field} for {id} must be non-negative (got {value})")]
    NegativeValue {
        /// Name of the offending field
        field: String,
        /// ID of the entity the value belongs to
        id: String,
        /// The invalid value
        value: f64,
    },
    /// A value is NaN or infinite
    #[error("{field} for {id} must be finite")]
    NonFinite {
        /// Name of the offending field
        field: String,
        /// ID of the entity the value belongs to
        id: String,
    },
    /// The same ID appears more than once
    #[error("Duplicate {kind} ID: {id}")]
    DuplicateId {
        /// The kind of entity (e.g. supplier)
        kind: String,
        /// The duplicated ID
        id: String,
    },
    /// A user-supplied big-M constant could bind when the activation flag is set
    #[error(
        "big_m ({big_m}) is smaller than the largest copper mass purchasable in a period \
        ({required}), so it could cut off feasible plans"
    )]
    BigMTooSmall {
        /// The supplied constant
        big_m: f64,
        /// The smallest safe value
        required: f64,
    },
}

/// A structural contradiction which can be detected without solving
#[derive(Debug, Error, PartialEq)]
pub enum InfeasibleSpecError {
    /// The planning horizon is empty
    #[error("The planning horizon has no periods")]
    NoPeriods,
    /// There is nothing to buy
    #[error("No suppliers were given")]
    NoSuppliers,
    /// There is nothing to produce
    #[error("No products were given")]
    NoProducts,
}

/// Any error which aborts a single planning attempt
#[derive(Debug, Error, PartialEq)]
pub enum BlendError {
    /// See [`ValidationError`]
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// See [`InfeasibleSpecError`]
    #[error(transparent)]
    InfeasibleSpec(#[from] InfeasibleSpecError),
}

/// Convenience alias for results from the planning library
pub type BlendResult<T> = Result<T, BlendError>;
