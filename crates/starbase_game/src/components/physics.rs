//! Physics component

use serde::{Deserialize, Serialize};
use starbase_engine::foundation::id::ResourceId;
use starbase_engine::foundation::math::Vec2;

slotmap::new_key_type! {
    /// Handle of a body inside a physics space
    pub struct BodyHandle;
}

/// Shape and mass of a rigid body, in local units before scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDef {
    /// Mass
    pub mass: f32,
    /// Radius of the collision circle
    pub radius: f32,
    /// Local mounting point of the primary weapon
    pub hardpoint: Option<[f32; 2]>,
}

impl BodyDef {
    /// Circular body without a hardpoint
    pub fn circle(mass: f32, radius: f32) -> Self {
        Self { mass, radius, hardpoint: None }
    }

    /// Add a weapon hardpoint
    #[must_use]
    pub fn with_hardpoint(mut self, x: f32, y: f32) -> Self {
        self.hardpoint = Some([x, y]);
        self
    }

    /// Hardpoint as a vector
    pub fn hardpoint(&self) -> Option<Vec2> {
        self.hardpoint.map(|[x, y]| Vec2::new(x, y))
    }
}

impl Default for BodyDef {
    fn default() -> Self {
        Self::circle(1.0, 1.0)
    }
}

/// Rigid body simulated by the physics system
///
/// `handle` is filled in by the physics system once the entity is committed
/// and cleared again when the component is removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Physics {
    /// Physics space the body lives in
    pub space_id: ResourceId,
    /// Body description
    pub body: BodyDef,
    /// Simulated body, if one has been created
    pub handle: Option<BodyHandle>,
}

impl Physics {
    /// Physics component that will get a body in `space_id`
    pub fn new(space_id: ResourceId, body: BodyDef) -> Self {
        Self { space_id, body, handle: None }
    }
}
