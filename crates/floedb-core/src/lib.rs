//! Core runtime for FloeDB: typed table models, checked query composition
//! rendered to CQL text, snapshot-based change tracking, and the session
//! that drives both through a pluggable driver.

pub mod cql;
pub mod driver;
pub mod error;
pub mod expr;
pub mod model;
pub mod obs;
pub mod query;
pub mod session;
pub mod track;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use error::Error;

///
/// Prelude
///
/// Domain vocabulary only. Drivers, sinks, and statement internals stay
/// behind their modules.
///

pub mod prelude {
    pub use crate::{
        error::Error,
        query::{Cmp, FilterExpr, Query, ValueRow},
        session::{CancelToken, SaveOptions, Session},
        track::{EntityState, Table},
        traits::Entity,
        value::{CqlKind, Value},
    };
}
