//! Game systems
//!
//! Each system implements [`starbase_engine::ecs::System`] for
//! [`GameComponents`](crate::components::GameComponents) and is driven once
//! per tick by [`Game`](crate::game::Game).

pub mod autodestruct;
pub mod physics;
pub mod render_sync;
pub mod ship_controls;

pub use autodestruct::AutoDestructSystem;
pub use physics::{Body, PhysicsSystem, PhysicsWorld, SharedPhysicsWorld, Space};
pub use render_sync::{RenderItem, RenderSyncSystem};
pub use ship_controls::{BulletFired, ShipControlsSystem};
