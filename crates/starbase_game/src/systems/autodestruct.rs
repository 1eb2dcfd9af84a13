//! Timed entity removal

use starbase_engine::ecs::System;
use starbase_engine::foundation::time::Tick;

use crate::components::{AutoDestruct, Entity, EntityManager, GameComponents};

/// Flags entities for removal once their [`AutoDestruct`] timer runs out
///
/// Flagged entities are removed by the next refresh.
#[derive(Debug, Default)]
pub struct AutoDestructSystem;

impl AutoDestructSystem {
    /// Create the system
    pub fn new() -> Self {
        Self
    }
}

impl System<GameComponents> for AutoDestructSystem {
    fn update(&mut self, entities: &mut EntityManager, tick: &Tick) {
        entities.for_each_entity_with::<(AutoDestruct,), _>(
            |entity: &mut Entity, (timer,): (&mut AutoDestruct,)| {
                if timer.expired(tick.step) && !entity.needs_to_die() {
                    log::trace!("Entity {} expired at step {}", entity.id(), tick.step);
                    entity.mark_for_removal();
                }
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_survives_through_die_step() {
        let mut entities = EntityManager::new();
        let id = entities.create_entity_with((AutoDestruct::new(10, 5),)).id();
        entities.refresh();

        let mut system = AutoDestructSystem::new();
        system.update(&mut entities, &Tick { step: 15, dt: 0.0 });
        entities.refresh();
        assert!(entities.is_committed(id));

        system.update(&mut entities, &Tick { step: 16, dt: 0.0 });
        assert!(entities.get_entity(id).needs_to_die());
        entities.refresh();
        assert!(!entities.is_committed(id));
    }
}
