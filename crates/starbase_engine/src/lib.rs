//! # Starbase Engine
//!
//! The entity/component core of a 2D real-time game.
//!
//! ## Features
//!
//! - **Columnar Storage**: One dense column per component type, with free-list slot reuse
//! - **Deferred Commits**: New entities are staged until the next [`ecs::EntityManager::refresh`]
//! - **Typed Signals**: Entity and component lifecycle callbacks keyed by component type
//! - **Compile-Time Component Lists**: Dense indices assigned by [`component_list!`]
//!
//! ## Quick Start
//!
//! ```rust
//! use starbase_engine::prelude::*;
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Position(f32, f32);
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Health(u32);
//!
//! starbase_engine::component_list! {
//!     /// Components of this example.
//!     pub struct Components, storage ComponentsStorage {
//!         position: Position,
//!         health: Health,
//!     }
//! }
//!
//! let mut entities = EntityManager::<Components>::new();
//! let id = entities.create_entity_with((Position(1.0, 2.0),)).id();
//! entities.refresh();
//!
//! entities.add_component(id, Health(100));
//! assert!(entities.has_components::<(Position, Health)>(id));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod ecs;
pub mod events;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, CullOrder, EntityManagerConfig},
        ecs::{
            Component, ComponentBitset, ComponentBundle, ComponentList, ComponentQuery,
            Entity, EntityId, EntityManager, System, MAX_COMPONENTS,
        },
        events::{EntityEvent, EventManager},
        foundation::{
            id::{id, idc, ResourceId},
            math::Vec2,
            time::{FixedStep, Tick},
        },
    };
}
