//! Per-table tracking state and its public handle.

use crate::{
    error::Error,
    query::{FilterExpr, Query},
    session::{CancelToken, Session},
    track::{
        entry::{EntityState, TrackedEntry},
        key::EntityKey,
        registry::TrackerOps,
    },
    traits::Entity,
    value::Value,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

///
/// TableTracker
///
/// Identity map for one entity type. At most one tracked instance exists per
/// primary key; reads consult this map before materializing fresh copies.
///

#[derive(Debug, Default)]
pub(crate) struct TableTracker<E: Entity> {
    entries: Mutex<HashMap<EntityKey, TrackedEntry<E>>>,
}

impl<E: Entity> TableTracker<E> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Start tracking a new entity destined for insertion.
    pub fn add(&self, entity: E) -> Result<bool, Error> {
        self.insert_if_absent(entity, EntityState::Added)
    }

    /// Start tracking an existing row as already persisted.
    pub fn attach(&self, entity: E) -> Result<bool, Error> {
        self.insert_if_absent(entity, EntityState::Unchanged)
    }

    /// Stop tracking whatever is registered under this entity's key.
    pub fn detach(&self, entity: &E) -> Result<bool, Error> {
        let key = EntityKey::of(entity)?;
        Ok(self.lock().remove(&key).is_some())
    }

    /// Mark the row for deletion, tracking it first if it was unknown.
    pub fn delete(&self, entity: &E) -> Result<(), Error> {
        let key = EntityKey::of(entity)?;
        self.lock()
            .entry(key)
            .and_modify(|entry| entry.state = EntityState::Deleted)
            .or_insert_with(|| TrackedEntry::new(entity.clone(), EntityState::Deleted));
        Ok(())
    }

    /// Reader-side identity resolution: the already-tracked instance wins;
    /// an unknown row is attached as unchanged and returned.
    pub fn adopt(&self, entity: E) -> Result<E, Error> {
        let key = EntityKey::of(&entity)?;
        let mut entries = self.lock();

        if let Some(existing) = entries.get(&key) {
            return Ok(existing.entity.clone());
        }
        let entry = TrackedEntry::new(entity, EntityState::Unchanged);
        let adopted = entry.entity.clone();
        entries.insert(key, entry);
        Ok(adopted)
    }

    /// The tracked instance under a key, if any, deleted entries included.
    pub fn get(&self, key: &EntityKey) -> Option<E> {
        self.lock().get(key).map(|entry| entry.entity.clone())
    }

    /// Apply an in-place edit to the tracked instance with this key.
    /// Returns whether anything was tracked under the key.
    pub fn edit(&self, entity: &E, apply: impl FnOnce(&mut E)) -> Result<bool, Error> {
        let key = EntityKey::of(entity)?;
        let mut entries = self.lock();

        match entries.get_mut(&key) {
            Some(entry) => {
                apply(&mut entry.entity);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Clones of every tracked entity, deletions included.
    pub fn local(&self) -> Vec<E> {
        self.lock()
            .values()
            .map(|entry| entry.entity.clone())
            .collect()
    }

    pub fn state_of(&self, entity: &E) -> Result<Option<EntityState>, Error> {
        let key = EntityKey::of(entity)?;
        Ok(self.lock().get(&key).map(|entry| entry.state))
    }

    fn insert_if_absent(&self, entity: E, state: EntityState) -> Result<bool, Error> {
        let key = EntityKey::of(&entity)?;
        let mut entries = self.lock();

        if entries.contains_key(&key) {
            return Ok(false);
        }
        entries.insert(key, TrackedEntry::new(entity, state));
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EntityKey, TrackedEntry<E>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Entity> TrackerOps for TableTracker<E> {
    fn detect_changes(&self) -> Result<(), Error> {
        let mut entries = self.lock();
        for entry in entries.values_mut() {
            entry.detect_changes()?;
        }
        Ok(())
    }

    fn has_pending(&self) -> bool {
        self.lock().values().any(TrackedEntry::is_pending)
    }

    fn pending_statements(&self, default_keyspace: Option<&str>) -> Result<Vec<String>, Error> {
        let table = E::MODEL.table_ref(default_keyspace);
        let entries = self.lock();

        let mut statements = Vec::new();
        for entry in entries.values() {
            if let Some(text) = entry.statement(&table)? {
                statements.push(text);
            }
        }
        Ok(statements)
    }

    fn accept_all(&self) {
        let mut entries = self.lock();
        for entry in entries.values_mut() {
            entry.accept();
        }
        entries.retain(|_, entry| entry.state != EntityState::Detached);
    }
}

///
/// Table
///
/// Session-scoped handle over one entity type: tracking mutations on the
/// identity map plus keyed lookups. Obtained from [`Session::table`].
///

pub struct Table<'a, E: Entity> {
    session: &'a Session,
    tracker: Arc<TableTracker<E>>,
}

impl<'a, E: Entity> Table<'a, E> {
    pub(crate) fn new(session: &'a Session, tracker: Arc<TableTracker<E>>) -> Self {
        Self { session, tracker }
    }

    /// Track a new entity for insertion on the next save. Returns `false`
    /// when its key is already tracked.
    pub fn add(&self, entity: E) -> Result<bool, Error> {
        self.tracker.add(entity)
    }

    /// Track a batch of new entities; duplicates are skipped. Returns how
    /// many were newly tracked.
    pub fn add_range(&self, entities: impl IntoIterator<Item = E>) -> Result<usize, Error> {
        let mut added = 0;
        for entity in entities {
            if self.tracker.add(entity)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Track an existing row without scheduling any write. Returns `false`
    /// when its key is already tracked.
    pub fn attach(&self, entity: E) -> Result<bool, Error> {
        self.tracker.attach(entity)
    }

    /// Stop tracking the row with this entity's key. Returns whether a
    /// tracked instance was removed.
    pub fn detach(&self, entity: &E) -> Result<bool, Error> {
        self.tracker.detach(entity)
    }

    /// Schedule the row with this entity's key for deletion on the next
    /// save, whatever state it was tracked in before.
    pub fn delete(&self, entity: &E) -> Result<(), Error> {
        self.tracker.delete(entity)
    }

    /// Edit the tracked instance sharing this entity's key in place. The
    /// edit is picked up by the next change detection pass.
    pub fn edit(&self, entity: &E, apply: impl FnOnce(&mut E)) -> Result<bool, Error> {
        self.tracker.edit(entity, apply)
    }

    /// Every tracked entity of this type, pending deletions included.
    #[must_use]
    pub fn local(&self) -> Vec<E> {
        self.tracker.local()
    }

    pub fn state_of(&self, entity: &E) -> Result<Option<EntityState>, Error> {
        self.tracker.state_of(entity)
    }

    /// Keyed lookup: the tracked instance if one exists, otherwise a by-key
    /// read. A fetched row joins tracking as unchanged; a miss stays
    /// untracked.
    pub fn find(&self, key_values: Vec<Value>) -> Result<Option<E>, Error> {
        let key = EntityKey::from_values::<E>(key_values)?;
        if let Some(entity) = self.tracker.get(&key) {
            return Ok(Some(entity));
        }

        self.find_query(&key).first()
    }

    pub async fn find_async(
        &self,
        key_values: Vec<Value>,
        cancel: &CancelToken,
    ) -> Result<Option<E>, Error> {
        let key = EntityKey::from_values::<E>(key_values)?;
        if let Some(entity) = self.tracker.get(&key) {
            return Ok(Some(entity));
        }

        let mut rows = self
            .find_query(&key)
            .take(1)
            .rows_async(cancel)
            .await?;
        Ok(rows.pop())
    }

    /// A fresh query over this table.
    #[must_use]
    pub fn query(&self) -> Query<'a, E> {
        self.session.query()
    }

    fn find_query(&self, key: &EntityKey) -> Query<'a, E> {
        let mut query = self.session.query::<E>();
        for (column, value) in E::MODEL.key_columns().zip(key.values()) {
            query = query.filter(FilterExpr::eq(column.name, value.clone()));
        }
        query
    }
}

///
/// TESTS
///
