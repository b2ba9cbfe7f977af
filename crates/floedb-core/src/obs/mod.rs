//! Observability: the statement-text sink sessions report into.
//!
//! Every rendered statement is reported to the session's sink immediately
//! before execution, or instead of it when execution is skipped. Nothing in
//! here touches the driver.

pub(crate) mod sink;

// re-exports
pub use sink::{CollectingSink, NullSink, StatementEvent, StatementKind, StatementSink};
