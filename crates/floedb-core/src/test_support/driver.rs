//! In-memory driver with scripted results and full statement recording.

use crate::{
    driver::{
        Batch, BatchKind, Consistency, Driver, DriverError, QueryOptions, Row, RowSource,
        Statement,
    },
    value::Value,
};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct MemoryRow(Vec<Value>);

impl Row for MemoryRow {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn get(&self, ordinal: usize) -> Option<&Value> {
        self.0.get(ordinal)
    }
}

struct MemoryRowSource {
    rows: VecDeque<Vec<Value>>,
}

impl RowSource for MemoryRowSource {
    fn next_row(&mut self) -> Result<Option<Box<dyn Row>>, DriverError> {
        Ok(self
            .rows
            .pop_front()
            .map(|cells| Box::new(MemoryRow(cells)) as Box<dyn Row>))
    }
}

///
/// RecordedBatch
///
/// Snapshot of everything one batch accumulated.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct RecordedBatch {
    pub kind: BatchKind,
    pub statements: Vec<(Statement, Consistency)>,
    pub committed: bool,
    pub rolled_back: bool,
}

struct MemoryBatch {
    record: Arc<Mutex<RecordedBatch>>,
}

impl Batch for MemoryBatch {
    fn kind(&self) -> BatchKind {
        lock(&self.record).kind
    }

    fn enlist(
        &mut self,
        statement: Statement,
        consistency: Consistency,
    ) -> Result<(), DriverError> {
        lock(&self.record).statements.push((statement, consistency));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        lock(&self.record).committed = true;
        Ok(())
    }

    fn rollback(&mut self) {
        lock(&self.record).rolled_back = true;
    }
}

///
/// MemoryDriver
///
/// Opens on demand, replays scripted result sets in FIFO order, and keeps
/// every statement and batch for later assertions. A query with nothing
/// scripted yields an empty result set.
///

#[derive(Default)]
pub(crate) struct MemoryDriver {
    open: AtomicBool,
    results: Mutex<VecDeque<Vec<Vec<Value>>>>,
    statements: Mutex<Vec<Statement>>,
    batches: Mutex<Vec<Arc<Mutex<RecordedBatch>>>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one result set; each query consumes one.
    pub fn script_rows(&self, rows: Vec<Vec<Value>>) {
        lock(&self.results).push_back(rows);
    }

    /// Every statement handed to `query` or `execute`, in order.
    pub fn statements(&self) -> Vec<Statement> {
        lock(&self.statements).clone()
    }

    pub fn statement_texts(&self) -> Vec<String> {
        lock(&self.statements)
            .iter()
            .map(|statement| statement.text.clone())
            .collect()
    }

    /// Snapshots of every batch handed out, in creation order.
    pub fn batches(&self) -> Vec<RecordedBatch> {
        lock(&self.batches)
            .iter()
            .map(|record| lock(record).clone())
            .collect()
    }

    pub fn is_opened(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> Result<(), DriverError> {
        if self.is_opened() {
            Ok(())
        } else {
            Err(DriverError::NotOpen)
        }
    }
}

impl Driver for MemoryDriver {
    fn open(&self) -> Result<(), DriverError> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.is_opened()
    }

    fn query(
        &self,
        statement: &Statement,
        _options: &QueryOptions,
    ) -> Result<Box<dyn RowSource>, DriverError> {
        self.check_open()?;
        lock(&self.statements).push(statement.clone());
        let rows = lock(&self.results).pop_front().unwrap_or_default();
        Ok(Box::new(MemoryRowSource { rows: rows.into() }))
    }

    fn execute(
        &self,
        statement: &Statement,
        _consistency: Consistency,
    ) -> Result<(), DriverError> {
        self.check_open()?;
        lock(&self.statements).push(statement.clone());
        Ok(())
    }

    fn batch(&self, kind: BatchKind) -> Result<Box<dyn Batch>, DriverError> {
        self.check_open()?;
        let record = Arc::new(Mutex::new(RecordedBatch {
            kind,
            ..RecordedBatch::default()
        }));
        lock(&self.batches).push(record.clone());
        Ok(Box::new(MemoryBatch { record }))
    }
}
