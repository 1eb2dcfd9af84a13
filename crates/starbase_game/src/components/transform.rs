//! Transform component

use starbase_engine::foundation::math::Vec2;

/// Placement and motion of an entity in the plane
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// World position
    pub pos: Vec2,
    /// Position before the last physics sync
    pub prev_pos: Vec2,
    /// Rotation in radians
    pub rot: f32,
    /// Per-axis scale
    pub scale: Vec2,
    /// Linear velocity
    pub vel: Vec2,
}

impl Transform {
    /// Transform at `pos` with no rotation, unit scale and no velocity
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            prev_pos: pos,
            ..Self::default()
        }
    }

    /// Set the rotation
    #[must_use]
    pub fn with_rotation(mut self, rot: f32) -> Self {
        self.rot = rot;
        self
    }

    /// Set a uniform scale
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec2::new(scale, scale);
        self
    }

    /// Set the linear velocity
    #[must_use]
    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: Vec2::zeros(),
            prev_pos: Vec2::zeros(),
            rot: 0.0,
            scale: Vec2::new(1.0, 1.0),
            vel: Vec2::zeros(),
        }
    }
}
