//! Game components
//!
//! Every component type of the game is declared once here, in
//! [`GameComponents`]. The declaration order fixes the dense index of each
//! type.

mod autodestruct;
mod physics;
mod renderable;
mod ship_controls;
mod transform;

pub use autodestruct::AutoDestruct;
pub use physics::{BodyDef, BodyHandle, Physics};
pub use renderable::Renderable;
pub use ship_controls::{ActionFlags, ShipControls};
pub use transform::Transform;

starbase_engine::component_list! {
    /// Component list of the game
    pub struct GameComponents, storage GameStorage {
        transform: Transform,
        physics: Physics,
        ship_controls: ShipControls,
        renderable: Renderable,
        auto_destruct: AutoDestruct,
    }
}

/// Entity record of the game
pub type Entity = starbase_engine::ecs::Entity<GameComponents>;

/// Entity manager of the game
pub type EntityManager = starbase_engine::ecs::EntityManager<GameComponents>;
