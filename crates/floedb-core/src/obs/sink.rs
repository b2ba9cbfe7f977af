//! Statement sink boundary.
//!
//! Execution logic never inspects what a sink does with an event; it only
//! reports. Sinks must tolerate concurrent reports from multiple threads.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum StatementKind {
    Query,
    Dml,
}

///
/// StatementEvent
///
/// One rendered statement as it leaves the session. `executed` is false
/// when skip-execute mode swallowed the statement instead of sending it.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StatementEvent {
    pub kind: StatementKind,
    pub text: String,
    pub executed: bool,
}

///
/// StatementSink
///

pub trait StatementSink: Send + Sync {
    fn record(&self, event: StatementEvent);
}

///
/// NullSink
///
/// Drops every event. The default when a session is built without a sink.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl StatementSink for NullSink {
    fn record(&self, _event: StatementEvent) {}
}

///
/// CollectingSink
///
/// Retains every event in arrival order, for assertions on generated text.
///

#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<StatementEvent>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<StatementEvent> {
        self.lock().clone()
    }

    /// Statement texts only, in arrival order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.lock().iter().map(|event| event.text.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StatementEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatementSink for CollectingSink {
    fn record(&self, event: StatementEvent) {
        self.lock().push(event);
    }
}

///
/// TESTS
///
