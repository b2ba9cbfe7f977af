//! Query composition, translation, and execution.
//!
//! A [`Query`] accumulates fluent composition calls, the translator rewrites
//! them into a select-statement tree while enforcing composition legality,
//! and a [`QueryPlan`] carries the rendered text plus projector for repeated
//! execution. All legality failures surface before any driver contact.

pub(crate) mod translate;

mod builder;
mod filter;
mod plan;
mod project;

// re-exports
pub use builder::Query;
pub use filter::{Cmp, FilterClause, FilterExpr, FilterValue};
pub use plan::QueryPlan;
pub use project::{Projector, ValueRow};

use crate::cql::RenderError;
use thiserror::Error as ThisError;

///
/// QueryError
///
/// Illegal composition, caught client-side before execution. Every variant
/// names the offending construct; none of these ever reach the driver.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    #[error("cannot filter after a row limit is set")]
    FilterAfterLimit,

    #[error("cannot order after a row limit is set")]
    OrderAfterLimit,

    #[error("cannot apply distinct after a row limit is set")]
    DistinctAfterLimit,

    #[error("count cannot be combined with distinct")]
    CountWithDistinct,

    #[error("table {table} has no column named {column}")]
    UnknownColumn {
        column: String,
        table: &'static str,
    },

    #[error("column {column} is not part of the current projection")]
    ColumnNotSelected { column: String },

    #[error("a projection must select at least one column")]
    EmptyProjection,

    #[error("{construct} predicates cannot be expressed in query text")]
    UnsupportedPredicate { construct: &'static str },

    #[error("column {column} cannot be compared against null")]
    NullComparison { column: String },

    #[error("column {column} expects {expected} values, found {found}")]
    KindMismatch {
        column: String,
        expected: String,
        found: &'static str,
    },

    #[error("statement expects {expected} bound parameters, found {found}")]
    ParamArity { expected: usize, found: usize },

    #[error("query matched more than one row")]
    MultipleRows,

    #[error(transparent)]
    Render(#[from] RenderError),
}
