//! The entity/component storage engine
//!
//! Entities live in one of three places:
//!
//! - the staging map, from creation until the next [`EntityManager::refresh`];
//! - a live slot of the dense entity array once committed;
//! - nowhere, after removal, leaving a cleared record in a free-listed slot.
//!
//! All structural growth of the dense arrays happens inside `refresh`. Systems
//! iterate committed entities only, so half-constructed entities are never
//! visited and no array reallocates under an iteration.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use crate::config::{CullOrder, EntityManagerConfig};
use crate::events::{EventManager, EntityEvent};

use super::component::{Component, ComponentList, ComponentVisitor};
use super::entity::{ComponentBitset, Entity, EntityId, MAX_COMPONENTS};
use super::query::{ComponentBundle, ComponentQuery};

/// Diagnostic counters of discouraged or ignored operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Component reads resolved through the staging map
    pub staged_accesses: u64,
    /// Component additions/removals and entity removals applied to staged entities
    pub staged_mutations: u64,
    /// Removals of components or entities that were not present
    pub ignored_removals: u64,
}

#[derive(Debug, Default)]
struct Diagnostics {
    staged_accesses: Cell<u64>,
    staged_mutations: Cell<u64>,
    ignored_removals: Cell<u64>,
}

impl Diagnostics {
    fn bump(counter: &Cell<u64>) {
        counter.set(counter.get() + 1);
    }
}

/// Where an id currently resides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Committed(usize),
    Staged,
    Missing,
}

/// Owner of every entity and component of the component list `L`
pub struct EntityManager<L: ComponentList> {
    entity_id_counter: EntityId,

    // Committed entities; unused slots hold cleared records with alive=false
    entities: Vec<Entity<L>>,
    // Entities created since the last refresh, in id order
    entities_new: BTreeMap<EntityId, Entity<L>>,
    // Slots of `entities` available for reuse
    entities_free: Vec<usize>,
    // Slot of every committed entity
    entities_index: HashMap<EntityId, usize>,

    storage: L::Storage,
    events: EventManager<L>,
    config: EntityManagerConfig,
    diagnostics: Diagnostics,
}

impl<L: ComponentList> EntityManager<L> {
    /// Create an entity manager with the default configuration
    pub fn new() -> Self {
        Self::with_config(EntityManagerConfig::default())
    }

    /// Create an entity manager with the given configuration
    pub fn with_config(config: EntityManagerConfig) -> Self {
        log::debug!(
            "Creating entity manager for {} component types (capacity {}, cull order {:?})",
            L::COUNT,
            config.initial_capacity,
            config.cull_order
        );

        Self {
            entity_id_counter: 0,
            entities: Vec::with_capacity(config.initial_capacity),
            entities_new: BTreeMap::new(),
            entities_free: Vec::new(),
            entities_index: HashMap::with_capacity(config.initial_capacity),
            storage: L::Storage::default(),
            events: EventManager::new(),
            config,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EntityManagerConfig {
        &self.config
    }

    /// Signal registry
    pub fn events(&self) -> &EventManager<L> {
        &self.events
    }

    /// Signal registry, for connecting callbacks and emitting user events
    pub fn events_mut(&mut self) -> &mut EventManager<L> {
        &mut self.events
    }

    /// Snapshot of the diagnostic counters
    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            staged_accesses: self.diagnostics.staged_accesses.get(),
            staged_mutations: self.diagnostics.staged_mutations.get(),
            ignored_removals: self.diagnostics.ignored_removals.get(),
        }
    }

    fn generate_id(&mut self) -> EntityId {
        self.entity_id_counter += 1;
        self.entity_id_counter
    }

    fn locate(&self, id: EntityId) -> Location {
        if let Some(&slot) = self.entities_index.get(&id) {
            Location::Committed(slot)
        } else if self.entities_new.contains_key(&id) {
            Location::Staged
        } else {
            Location::Missing
        }
    }

    fn staged_access_warning(&self, what: &str, id: EntityId) {
        Diagnostics::bump(&self.diagnostics.staged_accesses);
        if self.config.log_staged_access {
            log::warn!("Performance warning: {what} on entity {id} before it was committed");
        }
    }

    fn staged_mutation_warning(&self, what: &str, id: EntityId) {
        Diagnostics::bump(&self.diagnostics.staged_mutations);
        if self.config.log_staged_access {
            log::warn!("Performance warning: {what} on entity {id} inserted within the same frame");
        }
    }

    // ---------------------------------------------------------------------
    // Entity lookup
    // ---------------------------------------------------------------------

    /// Get a committed entity
    ///
    /// # Panics
    ///
    /// Panics if `id` is not committed (unknown, staged or removed).
    pub fn get_entity(&self, id: EntityId) -> &Entity<L> {
        self.try_get_entity(id)
            .unwrap_or_else(|| panic!("entity {id} is not committed"))
    }

    /// Get a committed entity mutably, e.g. to flag it for removal
    ///
    /// # Panics
    ///
    /// Panics if `id` is not committed.
    pub fn get_entity_mut(&mut self, id: EntityId) -> &mut Entity<L> {
        match self.entities_index.get(&id) {
            Some(&slot) => &mut self.entities[slot],
            None => panic!("entity {id} is not committed"),
        }
    }

    /// Get a committed entity, or `None`
    pub fn try_get_entity(&self, id: EntityId) -> Option<&Entity<L>> {
        self.entities_index.get(&id).map(|&slot| &self.entities[slot])
    }

    /// Get an entity whether committed or staged
    pub fn find_entity(&self, id: EntityId) -> Option<&Entity<L>> {
        self.try_get_entity(id).or_else(|| self.entities_new.get(&id))
    }

    fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity<L>> {
        match self.locate(id) {
            Location::Committed(slot) => Some(&mut self.entities[slot]),
            Location::Staged => self.entities_new.get_mut(&id),
            Location::Missing => None,
        }
    }

    /// Whether `id` refers to a committed entity
    pub fn is_committed(&self, id: EntityId) -> bool {
        self.entities_index.contains_key(&id)
    }

    /// Whether `id` refers to a staged entity
    pub fn is_staged(&self, id: EntityId) -> bool {
        self.entities_new.contains_key(&id)
    }

    /// Number of committed entities
    pub fn len(&self) -> usize {
        self.entities_index.len()
    }

    /// Whether there are no committed entities
    pub fn is_empty(&self) -> bool {
        self.entities_index.is_empty()
    }

    /// Number of staged entities
    pub fn staged_len(&self) -> usize {
        self.entities_new.len()
    }

    /// Dense-array slot of a committed entity
    pub fn entity_slot(&self, id: EntityId) -> Option<usize> {
        self.entities_index.get(&id).copied()
    }

    /// Entity slots vacated by removals and awaiting reuse
    pub fn free_entity_slots(&self) -> &[usize] {
        &self.entities_free
    }

    /// Dense-column slot of the committed component `C` of `id`
    pub fn component_slot<C: Component<L>>(&self, id: EntityId) -> Option<usize> {
        C::storage(&self.storage).slot_of(id)
    }

    /// Component slots of type `C` vacated by removals and awaiting reuse
    pub fn free_component_slots<C: Component<L>>(&self) -> &[usize] {
        C::storage(&self.storage).free_slots()
    }

    /// Flag an entity (committed or staged) for removal at the next refresh
    ///
    /// Returns `false` if the id is unknown.
    pub fn mark_for_removal(&mut self, id: EntityId) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.mark_for_removal();
                true
            }
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Component membership and access
    // ---------------------------------------------------------------------

    /// Whether entity `id` holds component `C`; `false` for unknown ids
    pub fn has_component<C: Component<L>>(&self, id: EntityId) -> bool {
        self.find_entity(id).is_some_and(|entity| entity.has_component::<C>())
    }

    /// Whether entity `id` holds every component of the tuple `Q`
    pub fn has_components<Q: ComponentQuery<L>>(&self, id: EntityId) -> bool {
        self.find_entity(id).is_some_and(|entity| entity.has_components::<Q>())
    }

    /// Get component `C` of entity `id`
    ///
    /// Staged entities are served from the staging map with a performance
    /// warning.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not hold `C` or is unknown.
    pub fn get_component<C: Component<L>>(&self, id: EntityId) -> &C {
        self.get_component_or_none(id).unwrap_or_else(|| {
            panic!("entity {id} has no component {}", C::type_name())
        })
    }

    /// Get component `C` of entity `id` mutably
    ///
    /// # Panics
    ///
    /// Panics if the entity does not hold `C` or is unknown.
    pub fn get_component_mut<C: Component<L>>(&mut self, id: EntityId) -> &mut C {
        self.get_component_mut_or_none(id).unwrap_or_else(|| {
            panic!("entity {id} has no component {}", C::type_name())
        })
    }

    /// Get component `C` of entity `id`, or `None` if it is not attached
    pub fn get_component_or_none<C: Component<L>>(&self, id: EntityId) -> Option<&C> {
        match self.locate(id) {
            Location::Committed(slot) => {
                if !self.entities[slot].has_component::<C>() {
                    return None;
                }
                let component = C::storage(&self.storage).get(id);
                debug_assert!(component.is_some(), "bitset/index mismatch for entity {id}");
                component
            }
            Location::Staged => {
                if !self.entities_new[&id].has_component::<C>() {
                    return None;
                }
                self.staged_access_warning("GetComponent", id);
                C::storage(&self.storage).get_staged(id)
            }
            Location::Missing => None,
        }
    }

    /// Get component `C` of entity `id` mutably, or `None` if it is not attached
    pub fn get_component_mut_or_none<C: Component<L>>(&mut self, id: EntityId) -> Option<&mut C> {
        match self.locate(id) {
            Location::Committed(slot) => {
                if !self.entities[slot].has_component::<C>() {
                    return None;
                }
                C::storage_mut(&mut self.storage).get_mut(id)
            }
            Location::Staged => {
                if !self.entities_new[&id].has_component::<C>() {
                    return None;
                }
                self.staged_access_warning("GetComponent", id);
                C::storage_mut(&mut self.storage).get_staged_mut(id)
            }
            Location::Missing => None,
        }
    }

    // ---------------------------------------------------------------------
    // Iteration
    // ---------------------------------------------------------------------

    /// Visit every committed entity in dense-array order
    pub fn for_each_entity<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Entity<L>),
    {
        for entity in &mut self.entities {
            if entity.alive {
                f(entity);
            }
        }
    }

    /// Visit every committed entity holding all components of `Q`
    ///
    /// The callback receives the entity and a tuple of mutable component
    /// references. Structural changes are not possible during the visit;
    /// collect ids and apply them afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names the same component type twice.
    pub fn for_each_entity_with<Q, F>(&mut self, mut f: F)
    where
        Q: ComponentQuery<L>,
        F: for<'a> FnMut(&'a mut Entity<L>, Q::Item<'a>),
    {
        let signature = Q::signature();
        assert_eq!(
            signature.len(),
            Q::arity(),
            "component query names the same type twice"
        );

        let mut columns = Q::take_columns(&mut self.storage);
        for entity in &mut self.entities {
            if !entity.alive || !entity.bitset.contains_all(signature) {
                continue;
            }
            let id = entity.id;
            match Q::fetch(&mut columns, id) {
                Some(item) => f(entity, item),
                None => log::error!("Entity {id} bitset {:?} disagrees with component index", entity.bitset),
            }
        }
        Q::restore_columns(&mut self.storage, columns);
    }

    /// Ids of committed entities holding all components of `Q`, in dense-array order
    pub fn entities_with<Q: ComponentQuery<L>>(&self) -> Vec<EntityId> {
        let signature = Q::signature();
        self.entities
            .iter()
            .filter(|entity| entity.alive && entity.bitset.contains_all(signature))
            .map(Entity::id)
            .collect()
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    /// Stage a new entity with no components
    ///
    /// The entity is invisible to iteration and [`EntityManager::get_entity`]
    /// until the next [`EntityManager::refresh`].
    pub fn create_entity(&mut self) -> &mut Entity<L> {
        let id = self.generate_id();
        log::trace!("Staging entity {id}");
        self.entities_new.entry(id).or_insert_with(|| Entity::new(id))
    }

    /// Stage a new entity together with a tuple of components
    pub fn create_entity_with<B: ComponentBundle<L>>(&mut self, components: B) -> &mut Entity<L> {
        let id = self.generate_id();
        log::trace!("Staging entity {id} with components {:?}", B::signature());

        components.stage(&mut self.storage, id);
        let entity = self.entities_new.entry(id).or_insert_with(|| Entity::new(id));
        entity.bitset = B::signature();
        entity
    }

    // ---------------------------------------------------------------------
    // Component mutation
    // ---------------------------------------------------------------------

    /// Attach `component` to entity `id`
    ///
    /// On a committed entity the component is stored, the bit is set and
    /// then every "component added" callback of `C` runs with the entity and
    /// its previous bitset. On a staged entity the component is staged with a
    /// performance warning and no callback runs. A component that is already
    /// attached is replaced in place without a callback.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown.
    pub fn add_component<C: Component<L>>(&mut self, id: EntityId, component: C) -> &mut C {
        match self.locate(id) {
            Location::Committed(slot) => {
                if self.entities[slot].has_component::<C>() {
                    log::warn!("Entity {id} already has component {}, replacing it", C::type_name());
                    C::storage_mut(&mut self.storage).insert(id, component);
                } else {
                    C::storage_mut(&mut self.storage).insert(id, component);

                    let old_components = self.entities[slot].bitset;
                    self.entities[slot].bitset.set(C::INDEX);

                    let entity = self.entities[slot];
                    self.emit_component_added::<C>(&entity, old_components);
                }

                C::storage_mut(&mut self.storage).get_mut(id).unwrap_or_else(|| {
                    panic!("component {} of entity {id} was removed by a callback", C::type_name())
                })
            }
            Location::Staged => {
                self.staged_mutation_warning("AddComponent", id);
                if let Some(entity) = self.entities_new.get_mut(&id) {
                    entity.bitset.set(C::INDEX);
                }
                C::storage_mut(&mut self.storage).stage(id, component)
            }
            Location::Missing => panic!("cannot add {} to unknown entity {id}", C::type_name()),
        }
    }

    /// Detach component `C` from entity `id`
    ///
    /// On a committed entity every "component will be removed" callback of
    /// `C` runs first, with the entity (still holding the component) and the
    /// bitset it will have afterwards; the slot is then cleared and
    /// free-listed. On a staged entity the staged value is dropped with a
    /// performance warning and no callback runs. Removing a component that is
    /// not attached is logged and ignored.
    pub fn remove_component<C: Component<L>>(&mut self, id: EntityId) {
        match self.locate(id) {
            Location::Committed(slot) => {
                if !self.entities[slot].has_component::<C>() {
                    self.ignored_component_removal::<C>(id);
                    return;
                }
                self.remove_committed_component::<C>(slot);
            }
            Location::Staged => {
                let Some(entity) = self.entities_new.get_mut(&id) else {
                    return;
                };
                if !entity.has_component::<C>() {
                    self.ignored_component_removal::<C>(id);
                    return;
                }
                entity.bitset.clear(C::INDEX);
                C::storage_mut(&mut self.storage).unstage(id);
                self.staged_mutation_warning("RemoveComponent", id);
            }
            Location::Missing => self.ignored_component_removal::<C>(id),
        }
    }

    fn ignored_component_removal<C: Component<L>>(&self, id: EntityId) {
        Diagnostics::bump(&self.diagnostics.ignored_removals);
        log::warn!(
            "Entity {id} does not have component {} (index {}), so cannot remove!",
            C::type_name(),
            C::INDEX
        );
    }

    fn remove_committed_component<C: Component<L>>(&mut self, slot: usize) {
        let entity = self.entities[slot];
        let id = entity.id;
        let new_components = entity.bitset.without(C::INDEX);

        self.emit_component_removed::<C>(&entity, new_components);

        // a callback may have removed the component or the entity already
        match self.entities_index.get(&id) {
            Some(&slot) if self.entities[slot].has_component::<C>() => {
                C::storage_mut(&mut self.storage).remove(id);
                self.entities[slot].bitset.clear(C::INDEX);
            }
            _ => log::debug!("Component {} of entity {id} already detached by a callback", C::type_name()),
        }
    }

    // ---------------------------------------------------------------------
    // Entity removal
    // ---------------------------------------------------------------------

    /// Remove entity `id` and all of its components
    ///
    /// A committed entity first triggers the "entity removed" callbacks while
    /// still intact, then loses each attached component in type-list order
    /// (each triggering its "component will be removed" callbacks), repeating
    /// while callbacks attach more, and finally leaves a cleared record in a
    /// free-listed slot. A staged entity
    /// is dropped with a performance warning and no callback. Unknown ids are
    /// logged and ignored.
    pub fn remove_entity(&mut self, id: EntityId) {
        match self.locate(id) {
            Location::Committed(slot) => self.remove_committed_entity(slot),
            Location::Staged => {
                self.staged_mutation_warning("RemoveEntity", id);
                if let Some(entity) = self.entities_new.remove(&id) {
                    L::visit_types(&mut UnstageAttached { storage: &mut self.storage, entity: &entity });
                }
            }
            Location::Missing => {
                Diagnostics::bump(&self.diagnostics.ignored_removals);
                log::warn!("Entity {id} does not exist, so cannot remove!");
            }
        }
    }

    fn remove_committed_entity(&mut self, slot: usize) {
        let entity = self.entities[slot];
        let id = entity.id;
        log::trace!("Removing entity {id} from slot {slot}");

        self.emit_entity_removed(&entity);

        // callbacks may have removed the entity themselves
        if !self.entities_index.contains_key(&id) {
            return;
        }

        // removal callbacks may attach components again; each pass detaches
        // them with signals until the entity holds nothing
        for _ in 0..MAX_COMPONENTS {
            L::visit_types(&mut DetachAttached { manager: self, id });
            match self.entities_index.get(&id) {
                Some(&slot) if !self.entities[slot].bitset.is_empty() => {}
                Some(_) => break,
                None => return,
            }
        }

        let mut purge = PurgeAttached { storage: &mut self.storage, id, purged: 0 };
        L::visit_types(&mut purge);
        if purge.purged > 0 {
            log::warn!(
                "Entity {id} kept re-attaching components during removal, dropped {} without signals",
                purge.purged
            );
        }

        if let Some(slot) = self.entities_index.remove(&id) {
            self.entities[slot] = Entity::default();
            self.entities_free.push(slot);
        }
    }

    // ---------------------------------------------------------------------
    // Tick boundary
    // ---------------------------------------------------------------------

    /// Commit staged entities and cull entities flagged for removal
    ///
    /// Staged entities are committed in ascending id order, each firing the
    /// "entity added" callbacks once its components are in place. Entities
    /// staged by those callbacks are committed in the same pass. Afterwards
    /// every committed entity flagged with `needs_to_die` is removed, in the
    /// order given by [`EntityManagerConfig::cull_order`].
    pub fn refresh(&mut self) {
        while let Some((id, mut entity)) = self.entities_new.pop_first() {
            entity.is_new = false;

            let slot = if let Some(slot) = self.entities_free.pop() {
                self.entities[slot] = entity;
                slot
            } else {
                self.entities.push(entity);
                self.entities.len() - 1
            };
            self.entities_index.insert(id, slot);

            L::visit_types(&mut CommitAttached { storage: &mut self.storage, entity: &entity });
            log::trace!("Committed entity {id} to slot {slot}");

            self.emit_entity_added(&entity);
        }

        match self.config.cull_order {
            CullOrder::Slot => {
                // the array never grows during culling, only staging does
                for slot in 0..self.entities.len() {
                    let entity = &self.entities[slot];
                    if entity.alive && entity.needs_to_die {
                        self.remove_committed_entity(slot);
                    }
                }
            }
            CullOrder::Id => {
                let mut doomed: Vec<EntityId> = self
                    .entities
                    .iter()
                    .filter(|entity| entity.alive && entity.needs_to_die)
                    .map(Entity::id)
                    .collect();
                doomed.sort_unstable();
                for id in doomed {
                    if let Some(&slot) = self.entities_index.get(&id) {
                        self.remove_committed_entity(slot);
                    }
                }
            }
        }
    }

    /// Alias of [`EntityManager::refresh`]
    pub fn update(&mut self) {
        self.refresh();
    }

    // ---------------------------------------------------------------------
    // Signal emission
    // ---------------------------------------------------------------------

    // Each callback is detached only while it runs, so a nested emission of
    // the same signal skips just the callbacks already on the stack.

    fn emit_entity_added(&mut self, entity: &Entity<L>) {
        self.emit_entity_signal(EntityEvent::EntityAdded, entity);
    }

    fn emit_entity_removed(&mut self, entity: &Entity<L>) {
        self.emit_entity_signal(EntityEvent::EntityRemoved, entity);
    }

    fn emit_entity_signal(&mut self, kind: EntityEvent, entity: &Entity<L>) {
        let count = self.events.slot_count(kind);
        for index in 0..count {
            let Some(mut slot) = self.events.take_entity_slot(kind, index) else {
                continue;
            };
            slot(self, entity);
            self.events.restore_entity_slot(kind, index, slot);
        }
    }

    fn emit_component_added<C: Component<L>>(&mut self, entity: &Entity<L>, old_components: ComponentBitset) {
        self.emit_component_signal(EntityEvent::ComponentAdded(C::INDEX), entity, old_components);
    }

    fn emit_component_removed<C: Component<L>>(&mut self, entity: &Entity<L>, new_components: ComponentBitset) {
        self.emit_component_signal(EntityEvent::ComponentRemoved(C::INDEX), entity, new_components);
    }

    fn emit_component_signal(&mut self, kind: EntityEvent, entity: &Entity<L>, components: ComponentBitset) {
        let count = self.events.slot_count(kind);
        for index in 0..count {
            let Some(mut slot) = self.events.take_component_slot(kind, index) else {
                continue;
            };
            slot(self, entity, components);
            self.events.restore_component_slot(kind, index, slot);
        }
    }
}

impl<L: ComponentList> Default for EntityManager<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves the staged components of a freshly committed entity into the dense columns
struct CommitAttached<'a, L: ComponentList> {
    storage: &'a mut L::Storage,
    entity: &'a Entity<L>,
}

impl<L: ComponentList> ComponentVisitor<L> for CommitAttached<'_, L> {
    fn visit<C: Component<L>>(&mut self) {
        if self.entity.has_component::<C>() {
            C::storage_mut(self.storage).commit(self.entity.id);
        }
    }
}

/// Drops the staged components of a staged entity
struct UnstageAttached<'a, L: ComponentList> {
    storage: &'a mut L::Storage,
    entity: &'a Entity<L>,
}

impl<L: ComponentList> ComponentVisitor<L> for UnstageAttached<'_, L> {
    fn visit<C: Component<L>>(&mut self) {
        if self.entity.has_component::<C>() {
            C::storage_mut(self.storage).unstage(self.entity.id);
        }
    }
}

/// Removes every attached component of a committed entity, with signals
struct DetachAttached<'a, L: ComponentList> {
    manager: &'a mut EntityManager<L>,
    id: EntityId,
}

impl<L: ComponentList> ComponentVisitor<L> for DetachAttached<'_, L> {
    fn visit<C: Component<L>>(&mut self) {
        if let Some(&slot) = self.manager.entities_index.get(&self.id) {
            if self.manager.entities[slot].has_component::<C>() {
                self.manager.remove_committed_component::<C>(slot);
            }
        }
    }
}

/// Drops whatever committed components of `id` remain, without signals
struct PurgeAttached<'a, L: ComponentList> {
    storage: &'a mut L::Storage,
    id: EntityId,
    purged: usize,
}

impl<L: ComponentList> ComponentVisitor<L> for PurgeAttached<'_, L> {
    fn visit<C: Component<L>>(&mut self) {
        if C::storage_mut(self.storage).remove(self.id).is_some() {
            self.purged += 1;
        }
    }
}
