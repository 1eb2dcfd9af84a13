//! Render state extraction
//!
//! The renderer itself lives outside the simulation. This system keeps a
//! reference count per model, standing in for the GPU resources a renderer
//! would load and release, and produces the per-frame draw list.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use starbase_engine::ecs::{EntityId, System};
use starbase_engine::foundation::id::ResourceId;
use starbase_engine::foundation::math::Vec2;
use starbase_engine::foundation::time::Tick;

use crate::components::{Entity, EntityManager, GameComponents, Renderable, Transform};

/// One entity to draw this frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    /// Drawn entity
    pub entity: EntityId,
    /// Model resource id
    pub model: ResourceId,
    /// World position
    pub position: Vec2,
    /// Position before the last physics sync, for interpolation
    pub prev_position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    /// Per-axis scale
    pub scale: Vec2,
}

type ModelCounts = Rc<RefCell<HashMap<ResourceId, usize>>>;

/// Tracks model usage and collects [`RenderItem`]s
pub struct RenderSyncSystem {
    models: ModelCounts,
    items: Vec<RenderItem>,
}

impl RenderSyncSystem {
    /// Create the system and connect it to the lifecycle signals of `entities`
    pub fn new(entities: &mut EntityManager) -> Self {
        let models: ModelCounts = Rc::default();
        let events = entities.events_mut();

        let on_commit = Rc::clone(&models);
        events.connect_entity_added(move |manager, entity| {
            if let Some(renderable) = manager.get_component_or_none::<Renderable>(entity.id()) {
                acquire(&on_commit, renderable.model);
            }
        });

        let on_added = Rc::clone(&models);
        events.connect_component_added::<Renderable, _>(move |manager, entity, _| {
            acquire(&on_added, manager.get_component::<Renderable>(entity.id()).model);
        });

        let on_removed = Rc::clone(&models);
        events.connect_component_removed::<Renderable, _>(move |manager, entity, _| {
            release(&on_removed, manager.get_component::<Renderable>(entity.id()).model);
        });

        Self {
            models,
            items: Vec::new(),
        }
    }

    /// Number of live renderables using `model`
    pub fn model_refs(&self, model: ResourceId) -> usize {
        self.models.borrow().get(&model).copied().unwrap_or(0)
    }

    /// Number of distinct models in use
    pub fn loaded_models(&self) -> usize {
        self.models.borrow().len()
    }

    /// Draw list produced by the last update
    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    /// Rebuild the draw list from the committed entities
    pub fn collect(&mut self, entities: &mut EntityManager) -> &[RenderItem] {
        let items = &mut self.items;
        items.clear();
        entities.for_each_entity_with::<(Transform, Renderable), _>(
            |entity: &mut Entity, (transform, renderable): (&mut Transform, &mut Renderable)| {
                items.push(RenderItem {
                    entity: entity.id(),
                    model: renderable.model,
                    position: transform.pos,
                    prev_position: transform.prev_pos,
                    rotation: transform.rot,
                    scale: transform.scale,
                });
            },
        );
        &self.items
    }
}

impl System<GameComponents> for RenderSyncSystem {
    fn update(&mut self, entities: &mut EntityManager, _tick: &Tick) {
        self.collect(entities);
    }
}

fn acquire(models: &ModelCounts, model: ResourceId) {
    let mut models = models.borrow_mut();
    let count = models.entry(model).or_insert(0);
    if *count == 0 {
        log::debug!("Loading model {model:#010x}");
    }
    *count += 1;
}

fn release(models: &ModelCounts, model: ResourceId) {
    let mut models = models.borrow_mut();
    match models.get_mut(&model) {
        Some(count) if *count > 1 => *count -= 1,
        Some(_) => {
            models.remove(&model);
            log::debug!("Releasing model {model:#010x}");
        }
        None => log::warn!("Model {model:#010x} released more often than acquired"),
    }
}
