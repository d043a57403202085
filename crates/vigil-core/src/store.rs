// ── Snapshot store ──
//
// Concurrent map of last-known entity state. Writes are whole-value
// replacements keyed by `(Category, EntityId)`, so there are no
// partial-update races to guard against.

use std::sync::Arc;

use dashmap::DashMap;

use crate::model::{Category, EntityId, EntitySnapshot};

/// Last-known snapshot per device instance.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: DashMap<(Category, EntityId), Arc<EntitySnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` if it differs structurally from the one already
    /// held for its entity. Returns `true` when the store changed (new
    /// entity or new value) -- the caller dispatches listeners only then.
    pub fn apply(&self, snapshot: EntitySnapshot) -> bool {
        let key = (snapshot.category, snapshot.entity_id.clone());
        if let Some(existing) = self.entries.get(&key) {
            if **existing == snapshot {
                return false;
            }
        }
        self.entries.insert(key, Arc::new(snapshot));
        true
    }

    /// Look up the snapshot for one entity.
    pub fn get(&self, category: Category, entity_id: &EntityId) -> Option<Arc<EntitySnapshot>> {
        self.entries
            .get(&(category, entity_id.clone()))
            .map(|r| Arc::clone(r.value()))
    }

    /// All current snapshots, in no particular order.
    pub fn all(&self) -> Vec<Arc<EntitySnapshot>> {
        self.entries.iter().map(|r| Arc::clone(r.value())).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
