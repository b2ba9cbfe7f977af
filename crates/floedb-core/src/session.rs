//! Session orchestration.
//!
//! A [`Session`] owns one driver connection, the per-type change trackers,
//! and the statement sink. Queries borrow the session; saves walk every
//! tracker, render the pending work, and hand it to the driver as a batch.

use crate::{
    driver::{Batch, BatchKind, Consistency, Driver, QueryOptions, Statement},
    error::Error,
    obs::{NullSink, StatementEvent, StatementKind, StatementSink},
    query::Query,
    track::{registry::TrackerRegistry, Table, TableTracker},
    traits::Entity,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use thiserror::Error as ThisError;

///
/// SessionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SessionError {
    #[error("session configuration is locked once the connection opens")]
    ConfigLocked,
}

///
/// CancelToken
///
/// Cooperative cancellation for the async entry points. Cancellation is
/// checked between pipeline steps; statements already handed to the driver
/// are not recalled.
///

#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

///
/// SaveOptions
///

#[derive(Clone, Copy, Debug)]
pub struct SaveOptions {
    /// Consistency for the batched writes; the session default when `None`.
    pub consistency: Option<Consistency>,
    /// Whether a successful save re-baselines the trackers.
    pub accept: bool,
    pub batch_kind: BatchKind,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            consistency: None,
            accept: true,
            batch_kind: BatchKind::Logged,
        }
    }
}

#[derive(Debug, Default)]
struct Config {
    keyspace: Option<String>,
    skip_execute: bool,
    default_consistency: Consistency,
}

///
/// Session
///

pub struct Session {
    driver: Arc<dyn Driver>,
    config: Mutex<Config>,
    trackers: TrackerRegistry,
    sink: Arc<dyn StatementSink>,
}

impl Session {
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self::with_sink(driver, Arc::new(NullSink))
    }

    #[must_use]
    pub fn with_sink(driver: Arc<dyn Driver>, sink: Arc<dyn StatementSink>) -> Self {
        Self {
            driver,
            config: Mutex::new(Config::default()),
            trackers: TrackerRegistry::new(),
            sink,
        }
    }

    // ------------------------------------------------------------------
    // configuration
    // ------------------------------------------------------------------

    /// Set the default keyspace queries resolve against. Locked once the
    /// connection is open.
    pub fn set_keyspace(&self, keyspace: impl Into<String>) -> Result<(), SessionError> {
        if self.driver.is_open() {
            return Err(SessionError::ConfigLocked);
        }
        self.lock_config().keyspace = Some(keyspace.into());
        Ok(())
    }

    #[must_use]
    pub fn keyspace(&self) -> Option<String> {
        self.lock_config().keyspace.clone()
    }

    /// When set, statements are rendered and reported but never executed.
    pub fn set_skip_execute(&self, skip: bool) {
        self.lock_config().skip_execute = skip;
    }

    #[must_use]
    pub fn skip_execute(&self) -> bool {
        self.lock_config().skip_execute
    }

    pub fn set_default_consistency(&self, consistency: Consistency) {
        self.lock_config().default_consistency = consistency;
    }

    #[must_use]
    pub fn default_consistency(&self) -> Consistency {
        self.lock_config().default_consistency
    }

    // ------------------------------------------------------------------
    // connection lifecycle
    // ------------------------------------------------------------------

    pub fn open(&self) -> Result<(), Error> {
        self.driver.open().map_err(Into::into)
    }

    pub fn close(&self) {
        self.driver.close();
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.driver.is_open()
    }

    pub(crate) fn ensure_open(&self) -> Result<(), Error> {
        if !self.driver.is_open() {
            self.driver.open()?;
        }
        Ok(())
    }

    pub(crate) async fn ensure_open_async(&self) -> Result<(), Error> {
        if !self.driver.is_open() {
            self.driver.open_async().await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // entry points
    // ------------------------------------------------------------------

    /// A fresh query over an entity's table.
    #[must_use]
    pub fn query<E: Entity>(&self) -> Query<'_, E> {
        Query::new(self)
    }

    /// The tracking handle for an entity's table.
    #[must_use]
    pub fn table<E: Entity>(&self) -> Table<'_, E> {
        Table::new(self, self.trackers.tracker::<E>())
    }

    // ------------------------------------------------------------------
    // save pipeline
    // ------------------------------------------------------------------

    /// Detect changes across every tracker and persist them as one logged
    /// batch. Returns the number of statements the save produced; a clean
    /// session returns zero without touching the driver.
    ///
    /// Diffing, enlisting, and acceptance are not isolated against each
    /// other: run one save per session at a time.
    pub fn save_changes(&self) -> Result<usize, Error> {
        self.save_changes_with(SaveOptions::default())
    }

    pub fn save_changes_with(&self, options: SaveOptions) -> Result<usize, Error> {
        let statements = self.pending_statements()?;
        if statements.is_empty() {
            return Ok(0);
        }

        if !self.log_dml(&statements) {
            self.accept_if(options.accept);
            return Ok(statements.len());
        }

        self.ensure_open()?;
        let consistency = options
            .consistency
            .unwrap_or_else(|| self.default_consistency());
        let mut batch = self.driver.batch(options.batch_kind)?;
        for text in &statements {
            batch.enlist(Statement::new(text.clone()), consistency)?;
        }
        batch.commit()?;

        self.accept_if(options.accept);
        Ok(statements.len())
    }

    /// Render the pending work into a caller-supplied batch. The batch is
    /// neither committed nor are the trackers re-baselined; both stay with
    /// the caller.
    pub fn save_changes_into(&self, batch: &mut dyn Batch) -> Result<usize, Error> {
        let statements = self.pending_statements()?;
        if statements.is_empty() {
            return Ok(0);
        }

        if !self.log_dml(&statements) {
            return Ok(statements.len());
        }

        let consistency = self.default_consistency();
        for text in &statements {
            batch.enlist(Statement::new(text.clone()), consistency)?;
        }
        Ok(statements.len())
    }

    pub async fn save_changes_async(&self, cancel: &CancelToken) -> Result<usize, Error> {
        let statements = self.pending_statements()?;
        if statements.is_empty() {
            return Ok(0);
        }

        if !self.log_dml(&statements) {
            self.accept_if(true);
            return Ok(statements.len());
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.ensure_open_async().await?;

        let consistency = self.default_consistency();
        let mut batch = self.driver.batch(BatchKind::Logged)?;
        for text in &statements {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            batch.enlist(Statement::new(text.clone()), consistency)?;
        }
        batch.commit_async().await?;

        self.accept_if(true);
        Ok(statements.len())
    }

    /// Whether any tracker holds pending work, after a fresh detection pass.
    pub fn has_changes(&self) -> Result<bool, Error> {
        for ops in self.trackers.all() {
            ops.detect_changes()?;
            if ops.has_pending() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Re-baseline every tracker as if the pending work had been persisted.
    pub fn accept_all_changes(&self) {
        for ops in self.trackers.all() {
            ops.accept_all();
        }
    }

    // ------------------------------------------------------------------
    // crate-internal collaborators
    // ------------------------------------------------------------------

    pub(crate) fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub(crate) fn tracker<E: Entity>(&self) -> Arc<TableTracker<E>> {
        self.trackers.tracker::<E>()
    }

    /// Report a statement to the sink. Returns whether execution should
    /// proceed; under `skip_execute` the statement is only reported.
    pub(crate) fn log_statement(&self, kind: StatementKind, text: &str) -> bool {
        let executed = !self.skip_execute();
        self.sink.record(StatementEvent {
            kind,
            text: text.to_owned(),
            executed,
        });
        executed
    }

    pub(crate) fn merge_options(&self, options: &QueryOptions) -> QueryOptions {
        QueryOptions {
            consistency: Some(
                options
                    .consistency
                    .unwrap_or_else(|| self.default_consistency()),
            ),
            page_size: options.page_size,
        }
    }

    fn pending_statements(&self) -> Result<Vec<String>, Error> {
        let keyspace = self.keyspace();
        let mut statements = Vec::new();
        for ops in self.trackers.all() {
            ops.detect_changes()?;
            statements.extend(ops.pending_statements(keyspace.as_deref())?);
        }
        Ok(statements)
    }

    fn log_dml(&self, statements: &[String]) -> bool {
        let mut proceed = true;
        for text in statements {
            proceed = self.log_statement(StatementKind::Dml, text);
        }
        proceed
    }

    fn accept_if(&self, accept: bool) {
        if accept {
            self.accept_all_changes();
        }
    }

    fn lock_config(&self) -> MutexGuard<'_, Config> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

///
/// TESTS
///
