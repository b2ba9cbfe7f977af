//! Type-erased registry of per-table trackers.

use crate::{error::Error, track::table::TableTracker, traits::Entity};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

///
/// TrackerOps
///
/// The save pipeline's view of one tracker, with the entity type erased:
/// settle states, report pending work, render it, and fold results back in.
///

pub(crate) trait TrackerOps: Send + Sync {
    fn detect_changes(&self) -> Result<(), Error>;

    fn has_pending(&self) -> bool;

    fn pending_statements(&self, default_keyspace: Option<&str>) -> Result<Vec<String>, Error>;

    fn accept_all(&self);
}

///
/// TrackerRegistry
///
/// One tracker per entity type, created lazily on first touch. Both views
/// of a tracker share one allocation: the typed handle for table access and
/// the erased handle for the save pipeline.
///

#[derive(Default)]
pub(crate) struct TrackerRegistry {
    trackers: Mutex<HashMap<TypeId, Registered>>,
}

struct Registered {
    typed: Arc<dyn Any + Send + Sync>,
    ops: Arc<dyn TrackerOps>,
}

impl TrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracker for one entity type, creating it on first use.
    pub fn tracker<E: Entity>(&self) -> Arc<TableTracker<E>> {
        let mut trackers = self.lock();

        if let Some(registered) = trackers.get(&TypeId::of::<E>()) {
            if let Ok(tracker) = Arc::downcast::<TableTracker<E>>(registered.typed.clone()) {
                return tracker;
            }
        }

        let tracker = Arc::new(TableTracker::<E>::new());
        trackers.insert(
            TypeId::of::<E>(),
            Registered {
                typed: tracker.clone(),
                ops: tracker.clone(),
            },
        );
        tracker
    }

    /// Erased handles over every tracker created so far.
    pub fn all(&self) -> Vec<Arc<dyn TrackerOps>> {
        self.lock()
            .values()
            .map(|registered| registered.ops.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TypeId, Registered>> {
        self.trackers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

///
/// TESTS
///
