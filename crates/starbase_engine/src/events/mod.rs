//! Entity lifecycle signals and user events
//!
//! Every [`EntityManager`] owns an [`EventManager`] holding four kinds of
//! synchronous signals:
//!
//! - "entity added", after an entity is committed during refresh;
//! - "entity removed", before a committed entity is torn down;
//! - "component added", one list per component type, after the component is attached;
//! - "component removed", one list per component type, before the component is detached.
//!
//! Callbacks run in connection order on the thread performing the mutation
//! and receive the manager itself, so they may read components and stage or
//! remove entities. Only the callback currently running is detached while it
//! runs: a nested emission of the same signal reaches every other callback,
//! and callbacks connected meanwhile first run on the next emission.
//!
//! User-defined event types can be broadcast through [`EventManager::emit`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::ecs::{Component, ComponentBitset, ComponentList, Entity, EntityManager};

/// Callback of the "entity added" and "entity removed" signals
pub type EntitySlot<L> = Box<dyn FnMut(&mut EntityManager<L>, &Entity<L>)>;

/// Callback of the "component added" and "component removed" signals
///
/// The bitset is the entity's membership *before* an addition, or *after*
/// a removal.
pub type ComponentSlot<L> = Box<dyn FnMut(&mut EntityManager<L>, &Entity<L>, ComponentBitset)>;

type Slots<S> = Vec<Option<S>>;

type UserSlots<E> = Vec<Box<dyn FnMut(&E)>>;

/// Signal kinds, used for introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityEvent {
    /// Entity committed
    EntityAdded,
    /// Entity about to be removed
    EntityRemoved,
    /// Component with the given dense index attached
    ComponentAdded(usize),
    /// Component with the given dense index about to be detached
    ComponentRemoved(usize),
}

/// Registry of lifecycle callbacks for the component list `L`
pub struct EventManager<L: ComponentList> {
    entity_added: Slots<EntitySlot<L>>,
    entity_removed: Slots<EntitySlot<L>>,
    component_added: Vec<Slots<ComponentSlot<L>>>,
    component_removed: Vec<Slots<ComponentSlot<L>>>,
    user: HashMap<TypeId, Box<dyn Any>>,
}

impl<L: ComponentList> EventManager<L> {
    /// Create an empty registry with one component slot list per listed type
    pub fn new() -> Self {
        Self {
            entity_added: Vec::new(),
            entity_removed: Vec::new(),
            component_added: std::iter::repeat_with(Vec::new).take(L::COUNT).collect(),
            component_removed: std::iter::repeat_with(Vec::new).take(L::COUNT).collect(),
            user: HashMap::new(),
        }
    }

    /// Run `slot` after every entity commit
    pub fn connect_entity_added<F>(&mut self, slot: F)
    where
        F: FnMut(&mut EntityManager<L>, &Entity<L>) + 'static,
    {
        self.entity_added.push(Some(Box::new(slot)));
    }

    /// Run `slot` before every committed entity removal
    pub fn connect_entity_removed<F>(&mut self, slot: F)
    where
        F: FnMut(&mut EntityManager<L>, &Entity<L>) + 'static,
    {
        self.entity_removed.push(Some(Box::new(slot)));
    }

    /// Run `slot` after component `C` is attached to a committed entity
    ///
    /// The bitset argument is the membership before the addition.
    pub fn connect_component_added<C, F>(&mut self, slot: F)
    where
        C: Component<L>,
        F: FnMut(&mut EntityManager<L>, &Entity<L>, ComponentBitset) + 'static,
    {
        self.component_added[C::INDEX].push(Some(Box::new(slot)));
    }

    /// Run `slot` before component `C` is detached from a committed entity
    ///
    /// The bitset argument is the membership after the removal.
    pub fn connect_component_removed<C, F>(&mut self, slot: F)
    where
        C: Component<L>,
        F: FnMut(&mut EntityManager<L>, &Entity<L>, ComponentBitset) + 'static,
    {
        self.component_removed[C::INDEX].push(Some(Box::new(slot)));
    }

    /// Number of callbacks connected to a signal
    pub fn slot_count(&self, kind: EntityEvent) -> usize {
        match kind {
            EntityEvent::EntityAdded => self.entity_added.len(),
            EntityEvent::EntityRemoved => self.entity_removed.len(),
            EntityEvent::ComponentAdded(index) => self.component_added.get(index).map_or(0, Vec::len),
            EntityEvent::ComponentRemoved(index) => self.component_removed.get(index).map_or(0, Vec::len),
        }
    }

    fn entity_slots_mut(&mut self, kind: EntityEvent) -> &mut Slots<EntitySlot<L>> {
        match kind {
            EntityEvent::EntityAdded => &mut self.entity_added,
            EntityEvent::EntityRemoved => &mut self.entity_removed,
            other => panic!("{other:?} is not an entity signal"),
        }
    }

    fn component_slots_mut(&mut self, kind: EntityEvent) -> &mut Slots<ComponentSlot<L>> {
        match kind {
            EntityEvent::ComponentAdded(index) => &mut self.component_added[index],
            EntityEvent::ComponentRemoved(index) => &mut self.component_removed[index],
            other => panic!("{other:?} is not a component signal"),
        }
    }

    /// Detach one entity signal callback while it runs
    ///
    /// Returns `None` if `index` is out of range or the callback is already
    /// running further up the stack.
    pub(crate) fn take_entity_slot(&mut self, kind: EntityEvent, index: usize) -> Option<EntitySlot<L>> {
        self.entity_slots_mut(kind).get_mut(index).and_then(Option::take)
    }

    /// Put back a callback taken by [`EventManager::take_entity_slot`]
    pub(crate) fn restore_entity_slot(&mut self, kind: EntityEvent, index: usize, slot: EntitySlot<L>) {
        if let Some(entry) = self.entity_slots_mut(kind).get_mut(index) {
            *entry = Some(slot);
        }
    }

    /// Detach one component signal callback while it runs
    pub(crate) fn take_component_slot(&mut self, kind: EntityEvent, index: usize) -> Option<ComponentSlot<L>> {
        self.component_slots_mut(kind).get_mut(index).and_then(Option::take)
    }

    /// Put back a callback taken by [`EventManager::take_component_slot`]
    pub(crate) fn restore_component_slot(&mut self, kind: EntityEvent, index: usize, slot: ComponentSlot<L>) {
        if let Some(entry) = self.component_slots_mut(kind).get_mut(index) {
            *entry = Some(slot);
        }
    }

    /// Register a handler for user events of type `E`
    pub fn connect<E: 'static>(&mut self, handler: impl FnMut(&E) + 'static) {
        let slots = self
            .user
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(UserSlots::<E>::new()));
        if let Some(slots) = slots.downcast_mut::<UserSlots<E>>() {
            slots.push(Box::new(handler));
        }
    }

    /// Deliver `event` to every handler registered for `E`, in registration
    /// order; returns the number of handlers reached
    pub fn emit<E: 'static>(&mut self, event: &E) -> usize {
        let Some(slots) = self
            .user
            .get_mut(&TypeId::of::<E>())
            .and_then(|slots| slots.downcast_mut::<UserSlots<E>>())
        else {
            log::trace!("No handlers for {}", std::any::type_name::<E>());
            return 0;
        };

        for handler in slots.iter_mut() {
            handler(event);
        }
        slots.len()
    }
}

impl<L: ComponentList> Default for EventManager<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ComponentList> fmt::Debug for EventManager<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("entity_added", &self.entity_added.len())
            .field("entity_removed", &self.entity_removed.len())
            .field("component_added", &self.component_added.iter().map(Vec::len).collect::<Vec<_>>())
            .field("component_removed", &self.component_removed.iter().map(Vec::len).collect::<Vec<_>>())
            .field("user_event_types", &self.user.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Default)]
    struct Marker;

    #[derive(Debug, Default)]
    struct Counter;

    crate::component_list! {
        struct TestComponents, storage TestStorage {
            marker: Marker,
            counter: Counter,
        }
    }

    struct Ping(u32);

    #[test]
    fn test_new_registry_is_empty() {
        let events = EventManager::<TestComponents>::new();
        assert_eq!(events.slot_count(EntityEvent::EntityAdded), 0);
        assert_eq!(events.slot_count(EntityEvent::ComponentAdded(1)), 0);
        assert_eq!(events.slot_count(EntityEvent::ComponentRemoved(99)), 0);
    }

    #[test]
    fn test_component_slots_are_keyed_by_type() {
        let mut events = EventManager::<TestComponents>::new();
        events.connect_component_added::<Counter, _>(|_, _, _| {});
        events.connect_component_added::<Counter, _>(|_, _, _| {});
        events.connect_component_removed::<Marker, _>(|_, _, _| {});

        assert_eq!(events.slot_count(EntityEvent::ComponentAdded(1)), 2);
        assert_eq!(events.slot_count(EntityEvent::ComponentAdded(0)), 0);
        assert_eq!(events.slot_count(EntityEvent::ComponentRemoved(0)), 1);
    }

    #[test]
    fn test_taken_slot_is_skipped_until_restored() {
        let mut events = EventManager::<TestComponents>::new();
        events.connect_entity_added(|_, _| {});
        events.connect_entity_added(|_, _| {});

        let running = events.take_entity_slot(EntityEvent::EntityAdded, 0);
        assert!(running.is_some());
        assert!(events.take_entity_slot(EntityEvent::EntityAdded, 0).is_none());
        assert_eq!(events.slot_count(EntityEvent::EntityAdded), 2);

        let other = events.take_entity_slot(EntityEvent::EntityAdded, 1);
        assert!(other.is_some());
        if let Some(other) = other {
            events.restore_entity_slot(EntityEvent::EntityAdded, 1, other);
        }
        if let Some(running) = running {
            events.restore_entity_slot(EntityEvent::EntityAdded, 0, running);
        }
        assert!(events.take_entity_slot(EntityEvent::EntityAdded, 0).is_some());
        assert!(events.take_entity_slot(EntityEvent::EntityAdded, 5).is_none());
    }

    #[test]
    fn test_user_events_reach_handlers_in_order() {
        let mut events = EventManager::<TestComponents>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            events.connect(move |ping: &Ping| seen.borrow_mut().push((tag, ping.0)));
        }

        assert_eq!(events.emit(&Ping(3)), 2);
        assert_eq!(*seen.borrow(), vec![("first", 3), ("second", 3)]);
        assert_eq!(events.emit(&"unhandled"), 0);
    }
}
