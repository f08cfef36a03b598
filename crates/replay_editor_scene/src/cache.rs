// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lock protected cache of committed object snapshots.
//!
//! This is the only scene state that may be read from another thread, e.g.
//! by a background save reading committed state while the editing thread
//! keeps working.

use crate::ids::ObjectId;
use crate::snapshot::SerializedReplayObject;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Snapshots keyed by object id
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: RwLock<IndexMap<ObjectId, Arc<SerializedReplayObject>>>,
}

impl SnapshotCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the committed snapshot of an object
    pub fn get(&self, id: &str) -> Option<Arc<SerializedReplayObject>> {
        self.entries.read().get(id).cloned()
    }

    /// Whether an object has a committed snapshot
    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Store a snapshot, returning the one it replaced
    pub fn insert(
        &self,
        id: ObjectId,
        snapshot: Arc<SerializedReplayObject>,
    ) -> Option<Arc<SerializedReplayObject>> {
        self.entries.write().insert(id, snapshot)
    }

    /// Drop an object's snapshot
    pub fn remove(&self, id: &str) -> Option<Arc<SerializedReplayObject>> {
        self.entries.write().shift_remove(id)
    }

    /// Move a snapshot to a new id, keeping its position
    pub fn rename(&self, from: &str, to: ObjectId) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&to) {
            return false;
        }
        let Some(index) = entries.get_index_of(from) else {
            return false;
        };
        let Some((_, snapshot)) = entries.shift_remove_index(index) else {
            return false;
        };
        let (last, _) = entries.insert_full(to, snapshot);
        entries.move_index(last, index);
        true
    }

    /// Consistent copy of every snapshot
    pub fn read_all(&self) -> IndexMap<ObjectId, Arc<SerializedReplayObject>> {
        self.entries.read().clone()
    }

    /// Swap in a whole new set of snapshots at once
    pub fn replace_all(&self, entries: IndexMap<ObjectId, Arc<SerializedReplayObject>>) {
        *self.entries.write() = entries;
    }

    /// Drop every snapshot
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Ids with a committed snapshot
    pub fn ids(&self) -> Vec<ObjectId> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of snapshots
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
