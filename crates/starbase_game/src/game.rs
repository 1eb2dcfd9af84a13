//! Per-tick game driver

use starbase_engine::config::{Config, ConfigError};
use starbase_engine::ecs::{EntityId, System};
use starbase_engine::foundation::id::{id, ResourceId};
use starbase_engine::foundation::math::Vec2;
use starbase_engine::foundation::time::{FixedStep, Tick};

use crate::components::{ActionFlags, BodyDef, EntityManager, Physics, Renderable, ShipControls, Transform};
use crate::config::GameConfig;
use crate::systems::{
    AutoDestructSystem, PhysicsSystem, RenderItem, RenderSyncSystem, SharedPhysicsWorld, ShipControlsSystem,
};

/// Space every spawned body lives in
pub const DEFAULT_SPACE: &str = "default";

/// Game errors
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Configuration values are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Entity does not exist or is not a ship
    #[error("Entity {0} is not a ship")]
    NotAShip(EntityId),
}

/// The simulation: entity store, clock and systems
pub struct Game {
    config: GameConfig,
    entities: EntityManager,
    clock: FixedStep,
    default_space: ResourceId,
    physics: PhysicsSystem,
    ship_controls: ShipControlsSystem,
    auto_destruct: AutoDestructSystem,
    render_sync: RenderSyncSystem,
}

impl Game {
    /// Create a game from `config`
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        if config.physics.tick_rate == 0 {
            return Err(GameError::InvalidConfig("physics.tick_rate must be positive".to_string()));
        }
        if config.bullet.body.mass <= 0.0 || config.ship.body.mass <= 0.0 {
            return Err(GameError::InvalidConfig("body masses must be positive".to_string()));
        }

        let mut entities = EntityManager::with_config(config.entities.clone());
        let physics = PhysicsSystem::new(&mut entities, &config.physics);
        let ship_controls = ShipControlsSystem::new(physics.world(), config.ship.clone(), config.bullet.clone());
        let render_sync = RenderSyncSystem::new(&mut entities);

        log::info!("Game created at {} ticks per second", config.physics.tick_rate);

        Ok(Self {
            clock: FixedStep::from_rate(config.physics.tick_rate),
            default_space: id(DEFAULT_SPACE),
            config,
            entities,
            physics,
            ship_controls,
            auto_destruct: AutoDestructSystem::new(),
            render_sync,
        })
    }

    /// Create a game from a `.toml` or `.ron` configuration file
    pub fn from_config_file(path: &str) -> Result<Self, GameError> {
        let config = GameConfig::load_from_file(path)?;
        Self::new(config)
    }

    /// Run one tick: commit and cull entities, then run every system
    pub fn update(&mut self) -> Tick {
        let tick = self.clock.advance();

        self.entities.refresh();
        self.physics.update(&mut self.entities, &tick);
        self.ship_controls.update(&mut self.entities, &tick);
        self.auto_destruct.update(&mut self.entities, &tick);

        tick
    }

    /// Draw list of the committed entities
    pub fn render(&mut self) -> &[RenderItem] {
        self.render_sync.collect(&mut self.entities)
    }

    /// Stage a ship at `pos`
    pub fn spawn_ship(&mut self, pos: Vec2, model: &str) -> EntityId {
        let physics = Physics::new(self.default_space, self.config.ship.body.clone());
        self.entities
            .create_entity_with((
                Transform::at(pos),
                physics,
                ShipControls::default(),
                Renderable::new(id(model)),
            ))
            .id()
    }

    /// Stage a massive body at `pos`
    pub fn spawn_planet(&mut self, pos: Vec2, mass: f32, radius: f32, model: &str) -> EntityId {
        self.entities
            .create_entity_with((
                Transform::at(pos),
                Physics::new(self.default_space, BodyDef::circle(mass, radius)),
                Renderable::new(id(model)),
            ))
            .id()
    }

    /// Replace the pilot input of ship `ship`
    pub fn set_ship_actions(&mut self, ship: EntityId, actions: ActionFlags) -> Result<(), GameError> {
        let controls = self
            .entities
            .get_component_mut_or_none::<ShipControls>(ship)
            .ok_or(GameError::NotAShip(ship))?;
        controls.action_flags = actions;
        Ok(())
    }

    /// Steps run so far
    pub fn step(&self) -> u64 {
        self.clock.step()
    }

    /// Active configuration
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Entity store
    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Entity store, for connecting signals or spawning entities directly
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    /// Shared physics world
    pub fn physics_world(&self) -> SharedPhysicsWorld {
        self.physics.world()
    }

    /// Model usage tracker
    pub fn render_sync(&self) -> &RenderSyncSystem {
        &self.render_sync
    }
}
