//! Entity manager behaviour tests
//!
//! Shared fixtures live here; the suites cover the entity lifecycle
//! (staging, commit, removal, slot reuse) and signal delivery.

mod signals;

use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::EntityManager;

#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct Health(pub i32);

#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct Tag(pub &'static str);

crate::component_list! {
    /// Component list of the test suites
    pub(super) struct TestComponents, storage TestStorage {
        position: Position,
        velocity: Velocity,
        health: Health,
        tag: Tag,
    }
}

pub(super) type Manager = EntityManager<TestComponents>;

pub(super) fn position(x: f32, y: f32) -> Position {
    Position { x, y }
}

pub(super) fn velocity(dx: f32, dy: f32) -> Velocity {
    Velocity { dx, dy }
}

/// Shared event log written by signal callbacks
pub(super) type Journal = Rc<RefCell<Vec<String>>>;

pub(super) fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub(super) fn manager() -> Manager {
    crate::foundation::logging::init_for_tests();
    Manager::new()
}
