//! System trait

use crate::foundation::time::Tick;

use super::component::ComponentList;
use super::entity_manager::EntityManager;

/// A unit of game logic run once per simulation step
///
/// Systems iterate committed entities through
/// [`EntityManager::for_each_entity_with`] and keep any state of their own.
/// Structural changes made during an update become visible to iteration at
/// the next [`EntityManager::refresh`].
pub trait System<L: ComponentList> {
    /// Run the system for one step
    fn update(&mut self, entities: &mut EntityManager<L>, tick: &Tick);

    /// Name used in log messages
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
