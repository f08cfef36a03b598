// SPDX-License-Identifier: MIT OR Apache-2.0
//! Arena backed object table with a two-way id mapping.

use crate::ids::ObjectId;
use crate::object::AnimationObject;
use indexmap::IndexMap;

/// Stable handle to a slot in an [`ObjectTable`].
///
/// A key stays valid until its object is removed; a reused slot gets a new
/// generation so stale keys resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<(ObjectId, AnimationObject)>,
}

/// Live objects of a scene, addressable by id or by key
#[derive(Debug, Default)]
pub struct ObjectTable {
    slots: Vec<Slot>,
    free: Vec<usize>,
    keys: IndexMap<ObjectId, ObjectKey>,
}

impl ObjectTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object, returning the one previously stored under `id`
    pub fn insert(&mut self, id: ObjectId, object: AnimationObject) -> Option<AnimationObject> {
        if let Some(key) = self.keys.get(&id).copied() {
            let slot = &mut self.slots[key.index];
            return slot.entry.replace((id, object)).map(|(_, old)| old);
        }

        let key = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.entry = Some((id.clone(), object));
                ObjectKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some((id.clone(), object)),
                });
                ObjectKey {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        self.keys.insert(id, key);
        None
    }

    /// Remove an object by id
    pub fn remove(&mut self, id: &str) -> Option<AnimationObject> {
        let key = self.keys.shift_remove(id)?;
        let slot = &mut self.slots[key.index];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        slot.entry.take().map(|(_, object)| object)
    }

    /// Move an object to a new id, keeping its key and table position.
    ///
    /// Fails (returning `false`) when `from` is missing or `to` is taken.
    pub fn rename(&mut self, from: &str, to: ObjectId) -> bool {
        if self.keys.contains_key(&to) {
            return false;
        }
        let Some(index) = self.keys.get_index_of(from) else {
            return false;
        };
        let key = self.keys[index];
        if let Some((id, _)) = self.slots[key.index].entry.as_mut() {
            *id = to.clone();
        }
        let last = self.keys.len() - 1;
        self.keys.shift_remove_index(index);
        self.keys.insert(to, key);
        // Put the renamed entry back where it was
        self.keys.move_index(last, index);
        true
    }

    /// Get an object by id
    pub fn get(&self, id: &str) -> Option<&AnimationObject> {
        self.get_by_key(*self.keys.get(id)?)
    }

    /// Get a mutable object by id
    pub fn get_mut(&mut self, id: &str) -> Option<&mut AnimationObject> {
        let key = *self.keys.get(id)?;
        self.get_by_key_mut(key)
    }

    /// Key of the object stored under `id`
    pub fn key_of(&self, id: &str) -> Option<ObjectKey> {
        self.keys.get(id).copied()
    }

    /// Id of the object a key points at
    pub fn id_of(&self, key: ObjectKey) -> Option<&ObjectId> {
        self.live_slot(key).map(|(id, _)| id)
    }

    /// Get an object by key
    pub fn get_by_key(&self, key: ObjectKey) -> Option<&AnimationObject> {
        self.live_slot(key).map(|(_, object)| object)
    }

    /// Get a mutable object by key
    pub fn get_by_key_mut(&mut self, key: ObjectKey) -> Option<&mut AnimationObject> {
        let slot = self.slots.get_mut(key.index)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.entry.as_mut().map(|(_, object)| object)
    }

    fn live_slot(&self, key: ObjectKey) -> Option<&(ObjectId, AnimationObject)> {
        let slot = self.slots.get(key.index)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    /// Whether an object is stored under `id`
    pub fn contains(&self, id: &str) -> bool {
        self.keys.contains_key(id)
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.keys.keys()
    }

    /// Objects in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &AnimationObject)> {
        self.keys.iter().filter_map(|(id, key)| Some((id, self.get_by_key(*key)?)))
    }

    /// Mutable objects, in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ObjectId, &mut AnimationObject)> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.entry.as_mut().map(|(id, object)| (&*id, object)))
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Remove every object
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.keys.clear();
    }
}
