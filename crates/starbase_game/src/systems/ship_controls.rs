//! Ship steering and weapons

use starbase_engine::ecs::{EntityId, System};
use starbase_engine::foundation::id::{id, ResourceId};
use starbase_engine::foundation::math::{rotate, Vec2};
use starbase_engine::foundation::time::Tick;

use crate::components::{
    ActionFlags, AutoDestruct, Entity, EntityManager, GameComponents, Physics, Renderable, ShipControls,
    Transform,
};
use crate::config::{BulletConfig, ShipConfig};

use super::physics::SharedPhysicsWorld;

/// Bullets leave along the ship's nose, a quarter turn behind its rotation
const NOSE_OFFSET: f32 = std::f32::consts::FRAC_PI_2;

/// Broadcast after a ship fires its primary weapon
#[derive(Debug, Clone, PartialEq)]
pub struct BulletFired {
    /// Firing ship
    pub ship: EntityId,
    /// Staged bullet entity
    pub bullet: EntityId,
    /// Spawn position
    pub position: Vec2,
    /// Spawn velocity
    pub velocity: Vec2,
}

#[derive(Debug)]
struct BulletSpawn {
    ship: EntityId,
    space_id: ResourceId,
    position: Vec2,
    velocity: Vec2,
}

/// Turns pilot input into torque, thrust and bullets
pub struct ShipControlsSystem {
    world: SharedPhysicsWorld,
    ship: ShipConfig,
    bullet: BulletConfig,
    bullet_model: ResourceId,
}

impl ShipControlsSystem {
    /// Create the system steering bodies of `world`
    pub fn new(world: SharedPhysicsWorld, ship: ShipConfig, bullet: BulletConfig) -> Self {
        let bullet_model = id(&bullet.model);
        Self {
            world,
            ship,
            bullet,
            bullet_model,
        }
    }

    fn steer(&self, entity: &Entity, transform: &Transform, physics: &Physics, controls: &mut ShipControls) -> Option<BulletSpawn> {
        let actions = controls.action_flags;
        let mut world = self.world.borrow_mut();
        let Some(body) = physics.handle.and_then(|handle| world.body_mut(physics.space_id, handle)) else {
            log::warn!("Ship {} has no physics body", entity.id());
            return None;
        };

        let angular_velocity = body.angular_velocity;
        body.apply_torque_impulse(-angular_velocity * self.ship.angular_damping);

        if actions.contains(ActionFlags::ROTATE_LEFT) && angular_velocity < self.ship.max_angular_velocity {
            body.apply_torque_impulse(self.ship.torque);
        }
        if actions.contains(ActionFlags::ROTATE_RIGHT) && angular_velocity > -self.ship.max_angular_velocity {
            body.apply_torque_impulse(-self.ship.torque);
        }
        if actions.contains(ActionFlags::THRUST_FORWARD) {
            body.apply_force_at_local_point(Vec2::new(0.0, -self.ship.thrust), Vec2::zeros());
        }

        if !actions.contains(ActionFlags::FIRE_PRIMARY) {
            return None;
        }
        controls.action_flags.remove(ActionFlags::FIRE_PRIMARY);

        let hardpoint = physics.body.hardpoint().unwrap_or_else(Vec2::zeros);
        let heading = transform.rot - NOSE_OFFSET;
        Some(BulletSpawn {
            ship: entity.id(),
            space_id: physics.space_id,
            position: transform.pos + rotate(hardpoint, transform.rot),
            velocity: Vec2::new(heading.cos(), heading.sin()) * self.bullet.speed + transform.vel,
        })
    }

    fn spawn_bullet(&self, entities: &mut EntityManager, spawn: &BulletSpawn, step: u64) -> EntityId {
        let transform = Transform::at(spawn.position)
            .with_scale(self.bullet.scale)
            .with_velocity(spawn.velocity);

        entities
            .create_entity_with((
                transform,
                Physics::new(spawn.space_id, self.bullet.body.clone()),
                Renderable::new(self.bullet_model),
                AutoDestruct::new(step, self.bullet.ttl),
            ))
            .id()
    }
}

impl System<GameComponents> for ShipControlsSystem {
    fn update(&mut self, entities: &mut EntityManager, tick: &Tick) {
        let mut spawns = Vec::new();
        entities.for_each_entity_with::<(Transform, Physics, ShipControls), _>(
            |entity: &mut Entity,
             (transform, physics, controls): (&mut Transform, &mut Physics, &mut ShipControls)| {
                if let Some(spawn) = self.steer(entity, transform, physics, controls) {
                    spawns.push(spawn);
                }
            },
        );

        for spawn in spawns {
            let bullet = self.spawn_bullet(entities, &spawn, tick.step);
            log::debug!("Ship {} fired bullet {bullet}", spawn.ship);
            entities.events_mut().emit(&BulletFired {
                ship: spawn.ship,
                bullet,
                position: spawn.position,
                velocity: spawn.velocity,
            });
        }
    }
}
