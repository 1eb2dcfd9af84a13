//! Columnar Component Storage
//! 
//! One [`ComponentStorage`] exists per component type. Committed values live
//! in a dense vector addressed through an id-to-slot index; values of staged
//! entities wait in an id-ordered map until the next commit. Vacated slots
//! are reset to `Default` and free-listed rather than erased, so the dense
//! vector never shrinks or compacts.

use std::collections::{BTreeMap, HashMap};

use super::entity::EntityId;

/// Storage for every instance of one component type
#[derive(Debug, Clone)]
pub struct ComponentStorage<C> {
    dense: Vec<C>,
    staged: BTreeMap<EntityId, C>,
    free: Vec<usize>,
    index: HashMap<EntityId, usize>,
}

impl<C> ComponentStorage<C> {
    /// Create an empty storage
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            staged: BTreeMap::new(),
            free: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Get the committed component of `id`
    pub fn get(&self, id: EntityId) -> Option<&C> {
        self.index.get(&id).map(|&slot| &self.dense[slot])
    }

    /// Get the committed component of `id` mutably
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut C> {
        let slot = *self.index.get(&id)?;
        Some(&mut self.dense[slot])
    }

    /// Get the staged component of `id`
    pub fn get_staged(&self, id: EntityId) -> Option<&C> {
        self.staged.get(&id)
    }

    /// Get the staged component of `id` mutably
    pub fn get_staged_mut(&mut self, id: EntityId) -> Option<&mut C> {
        self.staged.get_mut(&id)
    }

    /// Stage a component for an entity that has not been committed yet
    pub fn stage(&mut self, id: EntityId, component: C) -> &mut C {
        use std::collections::btree_map::Entry;

        match self.staged.entry(id) {
            Entry::Occupied(mut entry) => {
                entry.insert(component);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(component),
        }
    }

    /// Drop the staged component of `id`
    pub fn unstage(&mut self, id: EntityId) -> Option<C> {
        self.staged.remove(&id)
    }

    /// Slot holding the committed component of `id`
    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Slots vacated by removals and awaiting reuse, most recent last
    pub fn free_slots(&self) -> &[usize] {
        &self.free
    }

    /// Number of committed components
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no committed component exists
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of staged components
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Number of slots in the dense vector, live or free
    pub fn capacity_used(&self) -> usize {
        self.dense.len()
    }

    /// Store a committed component, reusing a free slot if one exists
    ///
    /// An existing component of `id` is overwritten in place.
    pub fn insert(&mut self, id: EntityId, component: C) -> usize {
        if let Some(&slot) = self.index.get(&id) {
            self.dense[slot] = component;
            return slot;
        }

        let slot = if let Some(slot) = self.free.pop() {
            self.dense[slot] = component;
            slot
        } else {
            self.dense.push(component);
            self.dense.len() - 1
        };

        self.index.insert(id, slot);
        slot
    }

    /// Move the staged component of `id` into the dense vector
    pub fn commit(&mut self, id: EntityId) -> Option<usize> {
        let component = self.staged.remove(&id)?;
        Some(self.insert(id, component))
    }
}

impl<C: Default> ComponentStorage<C> {
    /// Clear and free-list the committed component of `id`
    ///
    /// Returns the vacated slot.
    pub fn remove(&mut self, id: EntityId) -> Option<usize> {
        let slot = self.index.remove(&id)?;
        self.dense[slot] = C::default();
        self.free.push(slot);
        Some(slot)
    }
}

impl<C> Default for ComponentStorage<C> {
    fn default() -> Self {
        Self::new()
    }
}
