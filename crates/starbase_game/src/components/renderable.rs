//! Renderable component

use starbase_engine::foundation::id::ResourceId;

/// Model drawn at the entity's transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Renderable {
    /// Model resource id
    pub model: ResourceId,
}

impl Renderable {
    /// Renderable drawing `model`
    pub fn new(model: ResourceId) -> Self {
        Self { model }
    }
}
