use crate::{
    expr::TableRef,
    value::{CqlKind, MappingError, Value},
};
use std::fmt;

///
/// TableModel
///
/// Static schema descriptor for one entity type: table name, optional
/// keyspace, and the ordered column list. Declaration order is load-bearing
/// twice over: it fixes the select-list order of seeded queries, and the
/// partition/clustering subsets in declaration order define composite key
/// concatenation and hashing order.
///

pub struct TableModel<E: 'static> {
    pub table: &'static str,
    pub keyspace: Option<&'static str>,
    pub columns: &'static [ColumnModel<E>],
}

impl<E> TableModel<E> {
    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&'static ColumnModel<E>> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Position of a column within the declared column list.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn partition_keys(&self) -> impl Iterator<Item = &'static ColumnModel<E>> {
        self.columns
            .iter()
            .filter(|column| column.role == ColumnRole::PartitionKey)
    }

    pub fn clustering_keys(&self) -> impl Iterator<Item = &'static ColumnModel<E>> {
        self.columns
            .iter()
            .filter(|column| column.role == ColumnRole::ClusteringKey)
    }

    /// Key columns in canonical order: partition keys first, then clustering
    /// keys, each subset in declaration order.
    pub fn key_columns(&self) -> impl Iterator<Item = &'static ColumnModel<E>> {
        self.partition_keys().chain(self.clustering_keys())
    }

    pub fn regular_columns(&self) -> impl Iterator<Item = &'static ColumnModel<E>> {
        self.columns
            .iter()
            .filter(|column| column.role == ColumnRole::Regular)
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        self.key_columns().count()
    }

    /// Resolved table reference for rendering. The model keyspace qualifies
    /// the name only when the session default is absent or different; a
    /// matching default keeps statements unqualified.
    #[must_use]
    pub fn table_ref(&self, default_keyspace: Option<&str>) -> TableRef {
        let keyspace = match (self.keyspace, default_keyspace) {
            (Some(own), Some(default)) if own == default => None,
            (own, _) => own,
        };

        TableRef {
            keyspace,
            name: self.table,
        }
    }
}

impl<E> fmt::Debug for TableModel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableModel")
            .field("table", &self.table)
            .field("keyspace", &self.keyspace)
            .field("columns", &self.columns)
            .finish()
    }
}

///
/// ColumnModel
///
/// One column of a table model. The accessor pair moves values between the
/// entity struct and the runtime `Value` union; `set` fails when handed a
/// value the field cannot hold.
///

pub struct ColumnModel<E: 'static> {
    pub name: &'static str,
    pub kind: CqlKind,
    pub role: ColumnRole,
    pub get: fn(&E) -> Value,
    pub set: fn(&mut E, Value) -> Result<(), MappingError>,
}

impl<E> ColumnModel<E> {
    #[must_use]
    pub fn is_key(&self) -> bool {
        self.role != ColumnRole::Regular
    }

    #[must_use]
    pub fn read(&self, entity: &E) -> Value {
        (self.get)(entity)
    }

    pub fn write(&self, entity: &mut E, value: Value) -> Result<(), MappingError> {
        (self.set)(entity, value)
    }
}

impl<E> fmt::Debug for ColumnModel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnModel")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("role", &self.role)
            .finish()
    }
}

///
/// ColumnRole
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnRole {
    Regular,
    PartitionKey,
    ClusteringKey,
}

///
/// TESTS
///
