//! Change tracking.
//!
//! Entities read through trackable queries, attached by hand, or added for
//! insertion live in per-type identity maps owned by the session. Change
//! detection diffs each tracked instance against its last-accepted snapshot
//! and the save pipeline turns the diffs into DML.

mod entry;
mod key;
pub(crate) mod registry;
mod table;

pub use entry::EntityState;
pub use key::{EntityKey, KeyError};
pub use table::Table;

pub(crate) use table::TableTracker;
