//! Entity implementation

use std::fmt;
use std::marker::PhantomData;

use super::component::{Component, ComponentList};
use super::query::ComponentQuery;

/// Process-unique entity identifier; never reused
pub type EntityId = u64;

/// Upper bound on the number of component types in a [`ComponentList`]
pub const MAX_COMPONENTS: usize = 16;

/// Bitset recording which component types an entity holds
///
/// Bit `i` is set iff the component type with dense index `i` is attached.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComponentBitset(u16);

impl ComponentBitset {
    /// Bitset with no components
    pub const EMPTY: Self = Self(0);

    /// Bitset built from dense component indices
    pub fn from_indices(indices: &[usize]) -> Self {
        let mut bitset = Self::EMPTY;
        for &index in indices {
            bitset.set(index);
        }
        bitset
    }

    /// Set the bit for `index`
    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < MAX_COMPONENTS, "component index {index} out of range");
        self.0 |= 1 << index;
    }

    /// Clear the bit for `index`
    #[inline]
    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < MAX_COMPONENTS, "component index {index} out of range");
        self.0 &= !(1 << index);
    }

    /// Copy of this bitset with `index` set
    #[inline]
    #[must_use]
    pub fn with(mut self, index: usize) -> Self {
        self.set(index);
        self
    }

    /// Copy of this bitset with `index` cleared
    #[inline]
    #[must_use]
    pub fn without(mut self, index: usize) -> Self {
        self.clear(index);
        self
    }

    /// Whether the bit for `index` is set
    #[inline]
    pub fn has(self, index: usize) -> bool {
        index < MAX_COMPONENTS && (self.0 >> index) & 1 == 1
    }

    /// Whether every bit of `other` is also set here
    #[inline]
    pub fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of bits set
    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Raw bits
    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Iterate over the set indices in ascending order
    pub fn indices(self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let index = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(index)
        })
    }
}

impl fmt::Debug for ComponentBitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentBitset({:0width$b})", self.0, width = MAX_COMPONENTS)
    }
}

/// Per-entity record: identity, component membership and lifecycle flags
///
/// Parameterised by the component list so membership tests can be written
/// as `entity.has_component::<Transform>()`.
pub struct Entity<L> {
    pub(super) id: EntityId,
    pub(super) bitset: ComponentBitset,
    pub(super) alive: bool,
    pub(super) needs_to_die: bool,
    pub(super) is_new: bool,
    _list: PhantomData<fn() -> L>,
}

impl<L> Entity<L> {
    /// Freshly staged entity
    pub(super) fn new(id: EntityId) -> Self {
        Self {
            id,
            bitset: ComponentBitset::EMPTY,
            alive: true,
            needs_to_die: false,
            is_new: true,
            _list: PhantomData,
        }
    }

    /// Entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Attached component types
    pub fn bitset(&self) -> ComponentBitset {
        self.bitset
    }

    /// Whether this record occupies a live slot (or is staged)
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the entity is flagged for removal at the next refresh
    pub fn needs_to_die(&self) -> bool {
        self.needs_to_die
    }

    /// Whether the entity is still staged (created since the last refresh)
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Flag the entity for removal at the next refresh
    pub fn mark_for_removal(&mut self) {
        self.needs_to_die = true;
    }
}

impl<L: ComponentList> Entity<L> {
    /// Whether component `C` is attached
    pub fn has_component<C: Component<L>>(&self) -> bool {
        self.bitset.has(C::INDEX)
    }

    /// Whether every component of the tuple `Q` is attached
    pub fn has_components<Q: ComponentQuery<L>>(&self) -> bool {
        self.bitset.contains_all(Q::signature())
    }
}

impl<L> Default for Entity<L> {
    fn default() -> Self {
        Self {
            id: 0,
            bitset: ComponentBitset::EMPTY,
            alive: false,
            needs_to_die: false,
            is_new: false,
            _list: PhantomData,
        }
    }
}

impl<L> Clone for Entity<L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for Entity<L> {}

impl<L> PartialEq for Entity<L> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.bitset == other.bitset
            && self.alive == other.alive
            && self.needs_to_die == other.needs_to_die
            && self.is_new == other.is_new
    }
}

impl<L> Eq for Entity<L> {}

impl<L> fmt::Debug for Entity<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("bitset", &self.bitset)
            .field("alive", &self.alive)
            .field("needs_to_die", &self.needs_to_die)
            .field("is_new", &self.is_new)
            .finish()
    }
}
