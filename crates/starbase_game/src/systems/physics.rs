//! Rigid body simulation
//!
//! Bodies live in per-space arenas owned by [`PhysicsWorld`]. The physics
//! system keeps them in step with the `Physics` components:
//!
//! - a body is created when an entity holding `Physics` is committed, or when
//!   `Physics` is added to a committed entity;
//! - the body is freed before `Physics` is detached, including when its
//!   entity is removed.
//!
//! Every tick the world is stepped, pairwise gravity is accumulated for the
//! next step and body state is copied back into each `Transform`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use slotmap::SlotMap;
use starbase_engine::ecs::{EntityId, System};
use starbase_engine::foundation::id::ResourceId;
use starbase_engine::foundation::math::{rotate, Vec2};
use starbase_engine::foundation::time::Tick;

use crate::components::{BodyHandle, Entity, EntityManager, GameComponents, Physics, Transform};
use crate::config::PhysicsConfig;

/// Distances below this are treated as coincident and exert no gravity
const MIN_GRAVITY_DISTANCE: f32 = 1e-3;

/// Simulated rigid body
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Owning entity
    pub entity: EntityId,
    /// World position
    pub position: Vec2,
    /// Linear velocity
    pub velocity: Vec2,
    /// Rotation in radians
    pub angle: f32,
    /// Angular velocity in radians per second
    pub angular_velocity: f32,
    /// Mass
    pub mass: f32,
    /// Moment of inertia
    pub moment: f32,
    /// Radius after scaling
    pub radius: f32,
    force: Vec2,
    torque: f32,
}

impl Body {
    fn new(entity: EntityId, physics: &Physics, transform: &Transform) -> Self {
        let mass = physics.body.mass.max(f32::EPSILON);
        let radius = physics.body.radius * transform.scale.x.abs();
        // solid disc
        let moment = (0.5 * mass * radius * radius).max(f32::EPSILON);

        Self {
            entity,
            position: transform.pos,
            velocity: transform.vel,
            angle: transform.rot,
            angular_velocity: 0.0,
            mass,
            moment,
            radius,
            force: Vec2::zeros(),
            torque: 0.0,
        }
    }

    /// Accumulate a world-space force through the center of gravity
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Accumulate a body-space force applied at a body-space point
    pub fn apply_force_at_local_point(&mut self, force: Vec2, point: Vec2) {
        let world_force = rotate(force, self.angle);
        let world_point = rotate(point, self.angle);
        self.force += world_force;
        self.torque += world_point.perp(&world_force);
    }

    /// Apply an opposed impulse pair one unit either side of the center
    ///
    /// The resulting angular impulse is twice `torque`.
    pub fn apply_torque_impulse(&mut self, torque: f32) {
        self.angular_velocity += 2.0 * torque / self.moment;
    }

    /// Accumulated force for the next step
    pub fn force(&self) -> Vec2 {
        self.force
    }

    fn step(&mut self, dt: f32) {
        self.velocity += self.force / self.mass * dt;
        self.position += self.velocity * dt;
        self.angular_velocity += self.torque / self.moment * dt;
        self.angle += self.angular_velocity * dt;

        self.force = Vec2::zeros();
        self.torque = 0.0;
    }
}

/// One independent simulation space
#[derive(Debug, Default)]
pub struct Space {
    bodies: SlotMap<BodyHandle, Body>,
}

impl Space {
    /// Number of bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the space holds no bodies
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Iterate over the bodies
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter()
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            body.step(dt);
        }
    }

    fn apply_gravity(&mut self, gravity_constant: f32) {
        let sources: Vec<(BodyHandle, Vec2, f32)> = self
            .bodies
            .iter()
            .map(|(handle, body)| (handle, body.position, body.mass))
            .collect();

        for (target_handle, target) in &mut self.bodies {
            for &(source_handle, source_pos, source_mass) in &sources {
                if source_handle == target_handle {
                    continue;
                }
                let offset = source_pos - target.position;
                let distance = offset.norm();
                if distance < MIN_GRAVITY_DISTANCE {
                    continue;
                }
                let magnitude = gravity_constant * target.mass * source_mass / (distance * distance);
                target.apply_force(offset / distance * magnitude);
            }
        }
    }
}

/// All physics spaces, keyed by space id
#[derive(Debug)]
pub struct PhysicsWorld {
    spaces: HashMap<ResourceId, Space>,
    gravity_constant: f32,
}

impl PhysicsWorld {
    /// Create an empty world
    pub fn new(gravity_constant: f32) -> Self {
        Self {
            spaces: HashMap::new(),
            gravity_constant,
        }
    }

    /// Get a space
    pub fn space(&self, space_id: ResourceId) -> Option<&Space> {
        self.spaces.get(&space_id)
    }

    /// Total number of bodies across spaces
    pub fn body_count(&self) -> usize {
        self.spaces.values().map(Space::len).sum()
    }

    /// Get a body
    pub fn body(&self, space_id: ResourceId, handle: BodyHandle) -> Option<&Body> {
        self.spaces.get(&space_id)?.bodies.get(handle)
    }

    /// Get a body mutably
    pub fn body_mut(&mut self, space_id: ResourceId, handle: BodyHandle) -> Option<&mut Body> {
        self.spaces.get_mut(&space_id)?.bodies.get_mut(handle)
    }

    fn create_body(&mut self, entity: EntityId, physics: &Physics, transform: &Transform) -> BodyHandle {
        let space = self.spaces.entry(physics.space_id).or_insert_with(|| {
            log::debug!("Creating physics space {:#010x}", physics.space_id);
            Space::default()
        });
        space.bodies.insert(Body::new(entity, physics, transform))
    }

    fn free_body(&mut self, space_id: ResourceId, handle: BodyHandle) -> Option<Body> {
        self.spaces.get_mut(&space_id)?.bodies.remove(handle)
    }

    /// Advance every space by `dt` seconds, then accumulate gravity for the next step
    pub fn simulate(&mut self, dt: f32) {
        for space in self.spaces.values_mut() {
            space.step(dt);
            space.apply_gravity(self.gravity_constant);
        }
    }
}

/// Shared handle to the physics world, also used by systems steering bodies
pub type SharedPhysicsWorld = Rc<RefCell<PhysicsWorld>>;

/// Drives the physics world and mirrors it into transforms
pub struct PhysicsSystem {
    world: SharedPhysicsWorld,
}

impl PhysicsSystem {
    /// Create the system and connect it to the lifecycle signals of `entities`
    pub fn new(entities: &mut EntityManager, config: &PhysicsConfig) -> Self {
        let world = Rc::new(RefCell::new(PhysicsWorld::new(config.gravity_constant)));
        let events = entities.events_mut();

        let on_commit = Rc::clone(&world);
        events.connect_entity_added(move |manager, entity| {
            if entity.has_component::<Physics>() {
                attach_body(&on_commit, manager, entity);
            }
        });

        let on_added = Rc::clone(&world);
        events.connect_component_added::<Physics, _>(move |manager, entity, _| {
            attach_body(&on_added, manager, entity);
        });

        let on_removed = Rc::clone(&world);
        events.connect_component_removed::<Physics, _>(move |manager, entity, _| {
            let physics = manager.get_component_mut::<Physics>(entity.id());
            if let Some(handle) = physics.handle.take() {
                on_removed.borrow_mut().free_body(physics.space_id, handle);
                log::trace!("Freed body of entity {}", entity.id());
            }
        });

        Self { world }
    }

    /// Shared handle to the simulated world
    pub fn world(&self) -> SharedPhysicsWorld {
        Rc::clone(&self.world)
    }

    /// Advance the simulation by `dt` seconds
    pub fn simulate(&mut self, dt: f32) {
        self.world.borrow_mut().simulate(dt);
    }

    /// Copy body state into the transforms of simulated entities
    pub fn sync_transforms(&mut self, entities: &mut EntityManager) {
        let world = self.world.borrow();
        entities.for_each_entity_with::<(Transform, Physics), _>(
            |entity: &mut Entity, (transform, physics): (&mut Transform, &mut Physics)| {
                let Some(body) = physics.handle.and_then(|handle| world.body(physics.space_id, handle)) else {
                    log::warn!("Entity {} has a Physics component without a body", entity.id());
                    return;
                };
                transform.prev_pos = transform.pos;
                transform.pos = body.position;
                transform.rot = body.angle;
                transform.vel = body.velocity;
            },
        );
    }
}

impl System<GameComponents> for PhysicsSystem {
    fn update(&mut self, entities: &mut EntityManager, tick: &Tick) {
        self.simulate(tick.dt);
        self.sync_transforms(entities);
    }
}

fn attach_body(world: &SharedPhysicsWorld, manager: &mut EntityManager, entity: &Entity) {
    let id = entity.id();
    let transform = manager.get_component_or_none::<Transform>(id).cloned().unwrap_or_else(|| {
        log::warn!("Entity {id} has Physics but no Transform, placing body at the origin");
        Transform::default()
    });

    let physics = manager.get_component_mut::<Physics>(id);
    if let Some(stale) = physics.handle.take() {
        world.borrow_mut().free_body(physics.space_id, stale);
    }
    let handle = world.borrow_mut().create_body(id, physics, &transform);
    physics.handle = Some(handle);
    log::trace!("Created body for entity {id} in space {:#010x}", physics.space_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::BodyDef;
    use approx::assert_relative_eq;
    use starbase_engine::foundation::id::idc;

    fn setup() -> (EntityManager, PhysicsSystem) {
        let mut entities = EntityManager::new();
        let physics = PhysicsSystem::new(&mut entities, &PhysicsConfig::default());
        (entities, physics)
    }

    #[test]
    fn test_body_created_on_commit_and_on_add() {
        let (mut entities, physics) = setup();
        let space = idc("default");

        let staged = entities
            .create_entity_with((Transform::at(Vec2::new(1.0, 2.0)), Physics::new(space, BodyDef::default())))
            .id();
        let later = entities.create_entity_with((Transform::default(),)).id();
        entities.refresh();
        assert_eq!(physics.world().borrow().body_count(), 1);

        entities.add_component(later, Physics::new(space, BodyDef::default()));
        assert_eq!(physics.world().borrow().body_count(), 2);

        let handle = entities.get_component::<Physics>(staged).handle;
        let world = physics.world();
        let body = handle.and_then(|h| world.borrow().body(space, h).cloned()).unwrap();
        assert_eq!(body.entity, staged);
        assert_eq!(body.position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_body_freed_on_component_and_entity_removal() {
        let (mut entities, physics) = setup();
        let space = idc("default");
        let a = entities.create_entity_with((Transform::default(), Physics::new(space, BodyDef::default()))).id();
        let b = entities.create_entity_with((Transform::default(), Physics::new(space, BodyDef::default()))).id();
        entities.refresh();
        assert_eq!(physics.world().borrow().body_count(), 2);

        entities.remove_component::<Physics>(a);
        assert_eq!(physics.world().borrow().body_count(), 1);

        entities.remove_entity(b);
        assert_eq!(physics.world().borrow().body_count(), 0);
    }

    #[test]
    fn test_free_body_integrates_velocity() {
        let (mut entities, mut physics) = setup();
        let id = entities
            .create_entity_with((
                Transform::default().with_velocity(Vec2::new(2.0, 0.0)),
                Physics::new(idc("default"), BodyDef::default()),
            ))
            .id();
        entities.refresh();

        let tick = Tick { step: 0, dt: 0.5 };
        physics.update(&mut entities, &tick);
        physics.update(&mut entities, &tick);

        let transform = entities.get_component::<Transform>(id);
        assert_relative_eq!(transform.pos.x, 2.0);
        assert_relative_eq!(transform.prev_pos.x, 1.0);
        assert_relative_eq!(transform.vel.x, 2.0);
    }

    #[test]
    fn test_gravity_pulls_bodies_together() {
        let mut world = PhysicsWorld::new(20.0);
        let space = idc("default");
        let physics = Physics::new(space, BodyDef::circle(2.0, 1.0));
        let left = world.create_body(1, &physics, &Transform::at(Vec2::new(-1.0, 0.0)));
        let right = world.create_body(2, &physics, &Transform::at(Vec2::new(1.0, 0.0)));

        world.simulate(0.1);

        // G * m1 * m2 / d^2 = 20 * 2 * 2 / 4
        let pull = world.body(space, left).map(Body::force).unwrap();
        assert_relative_eq!(pull.x, 20.0);
        assert_relative_eq!(pull.y, 0.0);
        let push = world.body(space, right).map(Body::force).unwrap();
        assert_relative_eq!(push.x, -20.0);
    }

    #[test]
    fn test_spaces_do_not_interact() {
        let mut world = PhysicsWorld::new(20.0);
        let a = world.create_body(1, &Physics::new(idc("a"), BodyDef::default()), &Transform::default());
        let b = world.create_body(2, &Physics::new(idc("b"), BodyDef::default()), &Transform::at(Vec2::new(1.0, 0.0)));

        world.simulate(0.1);
        assert_eq!(world.body(idc("a"), a).map(Body::force), Some(Vec2::zeros()));
        assert_eq!(world.body(idc("b"), b).map(Body::force), Some(Vec2::zeros()));
        assert_eq!(world.space(idc("a")).map(Space::len), Some(1));
    }

    #[test]
    fn test_local_force_follows_body_rotation() {
        let mut body = Body::new(1, &Physics::default(), &Transform::default().with_rotation(std::f32::consts::FRAC_PI_2));
        body.apply_force_at_local_point(Vec2::new(0.0, -80.0), Vec2::zeros());
        assert_relative_eq!(body.force().x, 80.0, epsilon = 1e-4);
        assert_relative_eq!(body.force().y, 0.0, epsilon = 1e-4);
    }
}
