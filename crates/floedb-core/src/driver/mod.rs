//! The storage-engine driver contract.
//!
//! The core never speaks the wire protocol itself. Everything network-shaped
//! goes through [`Driver`]: open a connection, run a query text, enlist DML
//! into a batch. Results come back as forward-only [`RowSource`]s of decoded
//! [`Row`]s. Drivers are handed in by the caller; the crate only ships an
//! in-memory one for tests.

use crate::value::{Decimal, MappingError, Value};
use async_trait::async_trait;
use num_bigint::BigInt;
use serde::Serialize;
use std::net::IpAddr;
use thiserror::Error as ThisError;
use uuid::Uuid;

///
/// DriverError
///
/// Failures surfaced by the driver collaborator. These pass through the
/// core untouched; `AlreadyExists` stays structured so callers running
/// idempotent schema setup can swallow it.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DriverError {
    #[error("{keyspace}.{table} already exists")]
    AlreadyExists { keyspace: String, table: String },

    #[error("invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("protocol failure: {message}")]
    Protocol { message: String },

    #[error("connection is not open")]
    NotOpen,
}

impl DriverError {
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

///
/// Consistency
///
/// Tunable consistency level a statement executes under.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum Consistency {
    Any,
    #[default]
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

///
/// BatchKind
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum BatchKind {
    #[default]
    Logged,
    Unlogged,
    Counter,
}

///
/// Statement
///
/// One executable statement: rendered text plus positional parameters.
/// When `params` is non-empty the driver takes the prepare-and-bind path;
/// the text then carries `?` markers in parameter order.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: Vec<Value>,
}

impl Statement {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_params(text: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }
}

///
/// QueryOptions
///
/// Execution hints for a single query. Absent fields fall back to whatever
/// the driver or session defaults to.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueryOptions {
    pub consistency: Option<Consistency>,
    pub page_size: Option<i32>,
}

// ------------------------------------------------------------------------
// Row
// ------------------------------------------------------------------------

/// Implements typed per-ordinal accessors that map null cells to `None`.
macro_rules! row_accessor {
    ( $( $name:ident => $into:ident -> $ty:ty ),* $(,)? ) => {
        $(
            fn $name(&self, ordinal: usize) -> Result<Option<$ty>, MappingError> {
                match self.cell(ordinal)? {
                    Value::Null => Ok(None),
                    value => value.clone().$into().map(Some),
                }
            }
        )*
    }
}

///
/// Row
///
/// One decoded result row. Implementations supply `len` and `get`; the
/// typed accessors are derived and treat a null cell as `None` rather than
/// a kind mismatch.
///

pub trait Row: Send {
    /// Number of columns in the row.
    fn len(&self) -> usize;

    /// Cell at `ordinal`, if the row carries that column.
    fn get(&self, ordinal: usize) -> Option<&Value>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cell is absent or holds null.
    fn is_null(&self, ordinal: usize) -> bool {
        matches!(self.get(ordinal), None | Some(Value::Null))
    }

    /// Cell at `ordinal`, or an error naming the missing ordinal.
    fn cell(&self, ordinal: usize) -> Result<&Value, MappingError> {
        self.get(ordinal)
            .ok_or(MappingError::MissingOrdinal { ordinal })
    }

    row_accessor! {
        text => into_text -> String,
        int => into_int -> i32,
        bigint => into_bigint -> i64,
        boolean => into_bool -> bool,
        float => into_float -> f32,
        double => into_double -> f64,
        decimal => into_decimal -> Decimal,
        uuid => into_uuid -> Uuid,
        timestamp => into_timestamp -> i64,
        blob => into_blob -> Vec<u8>,
        inet => into_inet -> IpAddr,
        varint => into_varint -> BigInt,
        list => into_list -> Vec<Value>,
        set => into_set -> Vec<Value>,
        map => into_map -> Vec<(Value, Value)>,
    }
}

///
/// RowSource
///
/// Forward-only sequence of rows for one executed query. Sources are not
/// restartable; re-running the query produces a fresh source.
///

pub trait RowSource: Send {
    /// Next row, or `None` once the source is exhausted.
    fn next_row(&mut self) -> Result<Option<Box<dyn Row>>, DriverError>;
}

///
/// Batch
///
/// A transaction-like group of DML statements. Nothing is sent until
/// `commit`; dropping an uncommitted batch discards every enlisted
/// statement. The async commit defaults to the sync path, mirroring
/// [`Driver`].
///

#[async_trait]
pub trait Batch: Send {
    fn kind(&self) -> BatchKind;

    /// Add one statement to the batch.
    fn enlist(&mut self, statement: Statement, consistency: Consistency)
    -> Result<(), DriverError>;

    /// Submit the batch atomically.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// Discard the batch without sending it.
    fn rollback(&mut self);

    async fn commit_async(&mut self) -> Result<(), DriverError> {
        self.commit()
    }
}

///
/// Driver
///
/// The opaque storage-engine client. All methods take `&self`; drivers are
/// shared behind an `Arc` and manage their own interior state. The async
/// variants default to the sync path so purely local drivers implement the
/// sync surface only.
///

#[async_trait]
pub trait Driver: Send + Sync {
    fn open(&self) -> Result<(), DriverError>;

    fn close(&self);

    fn is_open(&self) -> bool;

    /// Run a query text and return its rows.
    fn query(
        &self,
        statement: &Statement,
        options: &QueryOptions,
    ) -> Result<Box<dyn RowSource>, DriverError>;

    /// Run a single statement that produces no rows.
    fn execute(&self, statement: &Statement, consistency: Consistency)
    -> Result<(), DriverError>;

    /// Start an empty batch.
    fn batch(&self, kind: BatchKind) -> Result<Box<dyn Batch>, DriverError>;

    async fn open_async(&self) -> Result<(), DriverError> {
        self.open()
    }

    async fn query_async(
        &self,
        statement: &Statement,
        options: &QueryOptions,
    ) -> Result<Box<dyn RowSource>, DriverError> {
        self.query(statement, options)
    }

    async fn execute_async(
        &self,
        statement: &Statement,
        consistency: Consistency,
    ) -> Result<(), DriverError> {
        self.execute(statement, consistency)
    }
}

///
/// TESTS
///
