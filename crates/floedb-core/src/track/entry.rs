//! Per-entity change accounting.
//!
//! Each tracked entity keeps a snapshot of its column values from the moment
//! it was attached or last accepted. Change detection diffs the live entity
//! against that snapshot; the diff drives which statement, if any, the entry
//! contributes to a save.

use crate::{
    cql::{dml, RenderError},
    error::{Error, InternalError},
    expr::TableRef,
    model::{ColumnRole, TableModel},
    traits::Entity,
    value::Value,
};
use derive_more::Display;
use serde::Serialize;

///
/// EntityState
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
pub enum EntityState {
    Added,
    Deleted,
    Detached,
    Modified,
    Unchanged,
}

///
/// TrackedEntry
///
/// The tracker owns the entity; callers only ever see clones. The snapshot
/// is refreshed on accept, so a second save after an accepted one starts
/// from a clean diff.
///

#[derive(Clone, Debug)]
pub(crate) struct TrackedEntry<E: Entity> {
    pub entity: E,
    pub state: EntityState,
    snapshot: Vec<Value>,
    changed: Vec<usize>,
}

impl<E: Entity> TrackedEntry<E> {
    pub fn new(entity: E, state: EntityState) -> Self {
        let snapshot = entity.column_values();
        Self {
            entity,
            state,
            snapshot,
            changed: Vec::new(),
        }
    }

    /// Diff the entity against its snapshot and settle the state.
    ///
    /// Key columns may never drift from the snapshot: the tracker maps
    /// entries by extracted key, and a silent key change would orphan the
    /// entry under a stale key.
    pub fn detect_changes(&mut self) -> Result<(), Error> {
        if self.state == EntityState::Detached {
            return Ok(());
        }

        let current = self.entity.column_values();
        for (ordinal, column) in E::MODEL.columns.iter().enumerate() {
            if column.is_key() && current[ordinal] != self.snapshot[ordinal] {
                return Err(
                    InternalError::tracker_corruption("tracked entity changed its key").into(),
                );
            }
        }

        // Added rows insert whole; deleted rows die whole. Only settled
        // entries need a column-level diff.
        if matches!(self.state, EntityState::Added | EntityState::Deleted) {
            return Ok(());
        }

        self.changed = E::MODEL
            .columns
            .iter()
            .enumerate()
            .filter(|(ordinal, column)| {
                !column.is_key() && current[*ordinal] != self.snapshot[*ordinal]
            })
            .map(|(ordinal, _)| ordinal)
            .collect();

        self.state = if self.changed.is_empty() {
            EntityState::Unchanged
        } else {
            EntityState::Modified
        };
        Ok(())
    }

    /// Fold the persisted outcome back in: deletions fall out of tracking,
    /// everything else becomes the new unchanged baseline.
    pub fn accept(&mut self) {
        if self.state == EntityState::Deleted {
            self.state = EntityState::Detached;
        } else {
            self.snapshot = self.entity.column_values();
            self.changed.clear();
            self.state = EntityState::Unchanged;
        }
    }

    pub const fn is_pending(&self) -> bool {
        matches!(
            self.state,
            EntityState::Added | EntityState::Deleted | EntityState::Modified
        )
    }

    /// Render this entry's contribution to a save, if it has one.
    ///
    /// Updates assign only the columns `detect_changes` flagged; deletes key
    /// off the snapshot, so a row is removed under the identity it was
    /// tracked by.
    pub fn statement(&self, table: &TableRef) -> Result<Option<String>, RenderError> {
        match self.state {
            EntityState::Added => {
                let pairs = Self::column_pairs(&self.entity.column_values());
                dml::build_insert(table, &pairs).map(Some)
            }
            EntityState::Modified => {
                let current = self.entity.column_values();
                let assignments: Vec<(&'static str, Value)> = self
                    .changed
                    .iter()
                    .map(|&ordinal| (E::MODEL.columns[ordinal].name, current[ordinal].clone()))
                    .collect();
                dml::build_update(table, &assignments, &key_pairs(E::MODEL, &current)).map(Some)
            }
            EntityState::Deleted => {
                dml::build_delete(table, &key_pairs(E::MODEL, &self.snapshot)).map(Some)
            }
            EntityState::Unchanged | EntityState::Detached => Ok(None),
        }
    }

    fn column_pairs(values: &[Value]) -> Vec<(&'static str, Value)> {
        E::MODEL
            .columns
            .iter()
            .zip(values)
            .map(|(column, value)| (column.name, value.clone()))
            .collect()
    }
}

/// Key name/value pairs in canonical key order, partition columns first.
fn key_pairs<E: Entity>(model: &TableModel<E>, values: &[Value]) -> Vec<(&'static str, Value)> {
    let mut pairs = Vec::new();
    for role in [ColumnRole::PartitionKey, ColumnRole::ClusteringKey] {
        for (ordinal, column) in model.columns.iter().enumerate() {
            if column.role == role {
                pairs.push((column.name, values[ordinal].clone()));
            }
        }
    }
    pairs
}

///
/// TESTS
///
