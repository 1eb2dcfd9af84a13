//! Signal delivery: ordering, visibility and re-entrancy

use super::*;
use crate::ecs::{Component, ComponentBitset, Entity};
use crate::events::EntityEvent;

fn index<C: Component<TestComponents>>() -> usize {
    C::INDEX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_added_sees_attached_component() {
        let mut entities = manager();
        let id = entities.create_entity_with((position(0.0, 0.0),)).id();
        entities.refresh();

        let seen = Rc::new(RefCell::new(None));
        let record = Rc::clone(&seen);
        entities
            .events_mut()
            .connect_component_added::<Health, _>(move |manager, entity, old| {
                let health = manager.get_component::<Health>(entity.id()).clone();
                *record.borrow_mut() = Some((health, entity.has_component::<Health>(), old));
            });

        entities.add_component(id, Health(42));

        let expected_old = ComponentBitset::from_indices(&[index::<Position>()]);
        assert_eq!(*seen.borrow(), Some((Health(42), true, expected_old)));
    }

    #[test]
    fn test_component_removed_sees_pre_removal_value() {
        let mut entities = manager();
        let id = entities.create_entity_with((position(0.0, 0.0), Health(7))).id();
        entities.refresh();

        let seen = Rc::new(RefCell::new(None));
        let record = Rc::clone(&seen);
        entities
            .events_mut()
            .connect_component_removed::<Health, _>(move |manager, entity, new| {
                let health = manager.get_component::<Health>(entity.id()).clone();
                let still_held = manager.has_component::<Health>(entity.id());
                *record.borrow_mut() = Some((health, still_held, new));
            });

        entities.remove_component::<Health>(id);

        let expected_new = ComponentBitset::from_indices(&[index::<Position>()]);
        assert_eq!(*seen.borrow(), Some((Health(7), true, expected_new)));
        assert!(!entities.has_component::<Health>(id));
        assert!(entities.get_component_or_none::<Health>(id).is_none());
    }

    #[test]
    fn test_slots_run_in_connection_order() {
        let mut entities = manager();
        let id = entities.create_entity().id();
        entities.refresh();

        let order = journal();
        for name in ["first", "second", "third"] {
            let log = Rc::clone(&order);
            entities
                .events_mut()
                .connect_component_added::<Tag, _>(move |_, _, _| log.borrow_mut().push(name.to_string()));
        }

        entities.add_component(id, Tag("t"));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_entity_added_fires_after_components_commit() {
        let mut entities = manager();
        let seen = journal();
        let log = Rc::clone(&seen);
        entities.events_mut().connect_entity_added(move |manager, entity| {
            let tag = manager.get_component::<Tag>(entity.id()).0;
            let committed = manager.is_committed(entity.id());
            log.borrow_mut().push(format!("{tag} committed={committed} new={}", entity.is_new()));
        });

        entities.create_entity_with((Tag("alpha"),));
        entities.create_entity_with((Tag("beta"),));
        assert!(seen.borrow().is_empty());

        entities.refresh();
        assert_eq!(
            *seen.borrow(),
            vec!["alpha committed=true new=false", "beta committed=true new=false"]
        );
        assert_eq!(entities.stats().staged_accesses, 0);
    }

    #[test]
    fn test_staged_operations_fire_no_signals() {
        let mut entities = manager();
        let fired = journal();
        let log = Rc::clone(&fired);
        entities
            .events_mut()
            .connect_component_added::<Health, _>(move |_, _, _| log.borrow_mut().push("added".into()));
        let log = Rc::clone(&fired);
        entities
            .events_mut()
            .connect_component_removed::<Health, _>(move |_, _, _| log.borrow_mut().push("removed".into()));
        let log = Rc::clone(&fired);
        entities
            .events_mut()
            .connect_entity_removed(move |_, _| log.borrow_mut().push("entity removed".into()));

        let id = entities.create_entity().id();
        entities.add_component(id, Health(1));
        entities.remove_component::<Health>(id);
        entities.add_component(id, Health(2));
        entities.remove_entity(id);

        assert!(fired.borrow().is_empty());
    }

    #[test]
    fn test_remove_entity_signals_then_detaches_each_component() {
        let mut entities = manager();
        let id = entities
            .create_entity_with((Tag("ship"), position(1.0, 1.0), Health(3)))
            .id();
        entities.refresh();

        let order = journal();
        let log = Rc::clone(&order);
        entities.events_mut().connect_entity_removed(move |manager, entity| {
            let intact = manager.has_components::<(Position, Health, Tag)>(entity.id());
            log.borrow_mut().push(format!("entity intact={intact}"));
        });
        let log = Rc::clone(&order);
        entities
            .events_mut()
            .connect_component_removed::<Position, _>(move |_, _, _| log.borrow_mut().push("position".into()));
        let log = Rc::clone(&order);
        entities
            .events_mut()
            .connect_component_removed::<Health, _>(move |_, _, _| log.borrow_mut().push("health".into()));
        let log = Rc::clone(&order);
        entities
            .events_mut()
            .connect_component_removed::<Tag, _>(move |manager, entity, _| {
                let tag = manager.get_component::<Tag>(entity.id()).0;
                log.borrow_mut().push(format!("tag {tag}"));
            });

        entities.remove_entity(id);

        assert_eq!(*order.borrow(), vec!["entity intact=true", "position", "health", "tag ship"]);
        assert!(entities.try_get_entity(id).is_none());
        assert_eq!(entities.free_component_slots::<Tag>(), &[0]);
    }

    #[test]
    fn test_component_readded_during_entity_removal_is_detached() {
        let mut entities = manager();
        let id = entities.create_entity_with((position(1.0, 1.0), Health(3))).id();
        entities.refresh();
        assert_eq!(entities.component_slot::<Position>(id), Some(0));

        let mut readded = false;
        entities
            .events_mut()
            .connect_component_removed::<Health, _>(move |manager, entity, _| {
                if !readded {
                    readded = true;
                    manager.add_component(entity.id(), position(2.0, 2.0));
                }
            });
        let detached = Rc::new(RefCell::new(0));
        let count = Rc::clone(&detached);
        entities
            .events_mut()
            .connect_component_removed::<Position, _>(move |_, _, _| *count.borrow_mut() += 1);

        entities.remove_entity(id);

        assert_eq!(*detached.borrow(), 2);
        assert!(entities.try_get_entity(id).is_none());
        assert_eq!(entities.component_slot::<Position>(id), None);
        assert_eq!(entities.free_component_slots::<Position>(), &[0]);
        assert_eq!(entities.free_entity_slots(), &[0]);
    }

    #[test]
    fn test_components_readded_forever_are_dropped_on_entity_removal() {
        let mut entities = manager();
        let id = entities.create_entity_with((Health(3),)).id();
        entities.refresh();

        entities
            .events_mut()
            .connect_component_removed::<Health, _>(|manager, entity, _| {
                manager.add_component(entity.id(), position(0.0, 0.0));
            });
        entities
            .events_mut()
            .connect_component_removed::<Position, _>(|manager, entity, _| {
                manager.add_component(entity.id(), Health(1));
            });

        entities.remove_entity(id);

        assert!(entities.try_get_entity(id).is_none());
        assert_eq!(entities.component_slot::<Position>(id), None);
        assert_eq!(entities.component_slot::<Health>(id), None);
        assert_eq!(entities.free_component_slots::<Position>(), &[0]);
    }

    #[test]
    fn test_entities_staged_by_callbacks_commit_in_same_refresh() {
        let mut entities = manager();
        entities.events_mut().connect_entity_added(|manager, entity| {
            if let Some(&Tag("spawner")) = manager.get_component_or_none::<Tag>(entity.id()) {
                manager.create_entity_with((Tag("spawned"),));
            }
        });

        entities.create_entity_with((Tag("spawner"),));
        entities.refresh();

        assert_eq!(entities.len(), 2);
        assert_eq!(entities.staged_len(), 0);
        assert_eq!(entities.entities_with::<(Tag,)>().len(), 2);
    }

    #[test]
    fn test_callbacks_may_remove_other_entities() {
        let mut entities = manager();
        let target = entities.create_entity_with((Tag("target"),)).id();
        let trigger = entities.create_entity().id();
        entities.refresh();

        entities
            .events_mut()
            .connect_component_added::<Health, _>(move |manager, _, _| manager.remove_entity(target));

        entities.add_component(trigger, Health(1));
        assert!(entities.try_get_entity(target).is_none());
        assert!(entities.has_component::<Health>(trigger));
    }

    #[test]
    fn test_nested_emission_reaches_callbacks_not_running() {
        let mut entities = manager();
        let a = entities.create_entity().id();
        let b = entities.create_entity().id();
        entities.refresh();

        let calls = journal();
        let log = Rc::clone(&calls);
        entities
            .events_mut()
            .connect_component_added::<Health, _>(move |manager, entity, _| {
                log.borrow_mut().push(format!("first {}", entity.id()));
                if entity.id() == a {
                    manager.add_component(b, Health(2));
                }
            });
        let log = Rc::clone(&calls);
        entities
            .events_mut()
            .connect_component_added::<Health, _>(move |_, entity, _| {
                log.borrow_mut().push(format!("second {}", entity.id()));
            });

        entities.add_component(a, Health(1));
        assert_eq!(
            *calls.borrow(),
            vec![format!("first {a}"), format!("second {b}"), format!("second {a}")]
        );
        assert!(entities.has_component::<Health>(b));
        assert_eq!(entities.events().slot_count(EntityEvent::ComponentAdded(index::<Health>())), 2);

        // the running callback is back in place afterwards
        calls.borrow_mut().clear();
        let c = entities.create_entity().id();
        entities.refresh();
        entities.add_component(c, Health(3));
        assert_eq!(*calls.borrow(), vec![format!("first {c}"), format!("second {c}")]);
    }

    #[test]
    fn test_entity_removed_inside_removal_callback_is_signalled() {
        let mut entities = manager();
        let a = entities.create_entity().id();
        let b = entities.create_entity().id();
        entities.refresh();

        entities.events_mut().connect_entity_removed(move |manager, entity| {
            if entity.id() == a {
                manager.remove_entity(b);
            }
        });
        let removed = Rc::new(RefCell::new(Vec::new()));
        let record = Rc::clone(&removed);
        entities
            .events_mut()
            .connect_entity_removed(move |_, entity| record.borrow_mut().push(entity.id()));

        entities.remove_entity(a);

        assert_eq!(*removed.borrow(), vec![b, a]);
        assert!(entities.try_get_entity(a).is_none());
        assert!(entities.try_get_entity(b).is_none());
    }

    #[test]
    fn test_slots_connected_during_emission_run_next_time() {
        let mut entities = manager();
        let calls = journal();
        let log = Rc::clone(&calls);
        entities.events_mut().connect_entity_added(move |manager, _| {
            let inner = Rc::clone(&log);
            log.borrow_mut().push("outer".into());
            manager
                .events_mut()
                .connect_entity_added(move |_, _| inner.borrow_mut().push("inner".into()));
        });

        entities.create_entity();
        entities.refresh();
        assert_eq!(*calls.borrow(), vec!["outer"]);
        assert_eq!(entities.events().slot_count(EntityEvent::EntityAdded), 2);

        calls.borrow_mut().clear();
        entities.create_entity();
        entities.refresh();
        assert_eq!(*calls.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_replacing_component_fires_nothing() {
        let mut entities = manager();
        let id = entities.create_entity_with((Health(1),)).id();
        entities.refresh();

        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        entities
            .events_mut()
            .connect_component_added::<Health, _>(move |_, _, _| *counter.borrow_mut() += 1);

        entities.add_component(id, Health(2));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_entity_argument_is_a_snapshot() {
        let mut entities = manager();
        let id = entities.create_entity_with((Health(1),)).id();
        entities.refresh();

        let seen: Rc<RefCell<Option<Entity<TestComponents>>>> = Rc::new(RefCell::new(None));
        let record = Rc::clone(&seen);
        entities
            .events_mut()
            .connect_component_added::<Tag, _>(move |_, entity, _| *record.borrow_mut() = Some(*entity));

        entities.add_component(id, Tag("x"));
        let snapshot = seen.borrow().unwrap_or_default();
        assert_eq!(snapshot.id(), id);
        assert!(snapshot.has_components::<(Health, Tag)>());
    }
}
