//! ## Crate layout
//! - `core`: table models, query composition, CQL rendering, change
//!   tracking, and the session runtime.
//!
//! The `prelude` module mirrors the surface application code touches;
//! driver implementors reach through `core::driver` instead.

pub use floedb_core as core;

pub use core::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        error::Error,
        query::{Cmp, FilterExpr, Query, ValueRow},
        session::{CancelToken, SaveOptions, Session},
        track::{EntityState, Table},
        traits::Entity,
        value::{CqlKind, Value},
    };
}

///
/// TESTS
///
