//! Game configuration

use serde::{Deserialize, Serialize};
use starbase_engine::config::{Config, EntityManagerConfig};

use crate::components::BodyDef;

/// Top-level game configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Entity storage settings
    pub entities: EntityManagerConfig,
    /// Simulation settings
    pub physics: PhysicsConfig,
    /// Ship handling
    pub ship: ShipConfig,
    /// Bullets fired by ships
    pub bullet: BulletConfig,
}

impl Config for GameConfig {}

/// Physics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Pairwise gravity constant
    pub gravity_constant: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            gravity_constant: 20.0,
        }
    }
}

/// Ship handling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Torque impulse per step for rotation input
    pub torque: f32,
    /// Rotation input is ignored beyond this angular velocity
    pub max_angular_velocity: f32,
    /// Angular velocity damping factor
    pub angular_damping: f32,
    /// Forward thrust force
    pub thrust: f32,
    /// Default ship body
    pub body: BodyDef,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            torque: 10.0,
            max_angular_velocity: 15.0,
            angular_damping: 4.0,
            thrust: 80.0,
            body: BodyDef::circle(1.0, 1.0).with_hardpoint(0.0, -1.5),
        }
    }
}

/// Bullet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    /// Muzzle speed relative to the ship
    pub speed: f32,
    /// Uniform transform scale
    pub scale: f32,
    /// Steps before the bullet removes itself
    pub ttl: u64,
    /// Model resource name
    pub model: String,
    /// Bullet body
    pub body: BodyDef,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            speed: 100.0,
            scale: 10.0,
            ttl: 120,
            model: "models/bullets/bullet-0".to_string(),
            body: BodyDef::circle(0.01, 0.05),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starbase_engine::config::CullOrder;

    #[test]
    fn test_defaults_match_ship_tuning() {
        let config = GameConfig::default();
        assert_eq!(config.physics.tick_rate, 60);
        assert_eq!(config.ship.max_angular_velocity, 15.0);
        assert_eq!(config.bullet.speed, 100.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = "[bullet]\nttl = 30\n\n[entities]\ncull_order = \"id\"\n";
        let config = GameConfig::from_toml_str(text).unwrap();
        assert_eq!(config.bullet.ttl, 30);
        assert_eq!(config.bullet.scale, 10.0);
        assert_eq!(config.entities.cull_order, CullOrder::Id);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = GameConfig::default();
        config.physics.gravity_constant = 5.0;
        let text = config.to_ron_string().unwrap();
        assert_eq!(GameConfig::from_ron_str(&text).unwrap(), config);
    }
}
