//! Entity-Component-System implementation
//!
//! Provides the staged/committed entity store, columnar component storage
//! and the typed iteration used by game systems.

pub mod entity;
pub mod component;
pub mod storage;
pub mod query;
pub mod entity_manager;
pub mod system;

#[cfg(test)]
mod tests;

pub use entity::{ComponentBitset, Entity, EntityId, MAX_COMPONENTS};
pub use component::{Component, ComponentList, ComponentVisitor};
pub use storage::ComponentStorage;
pub use query::{ComponentBundle, ComponentQuery};
pub use entity_manager::{EntityManager, ManagerStats};
pub use system::System;
