//! Math utilities and types
//!
//! The game is planar, so only 2D types are exposed.

pub use nalgebra::{Vector2, Rotation2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Rotate `v` counter-clockwise by `angle` radians
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Rotation2::new(angle) * v
}

/// Unit vector pointing along `angle` radians
pub fn from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
