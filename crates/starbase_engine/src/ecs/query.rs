//! Component tuples used for signatures, iteration and bundled creation
//!
//! Both traits are implemented for tuples of one to eight component types.
//! [`ComponentQuery`] drives [`EntityManager::for_each_entity_with`] and
//! `has_components`; [`ComponentBundle`] drives
//! [`EntityManager::create_entity_with`].
//!
//! [`EntityManager::for_each_entity_with`]: super::EntityManager::for_each_entity_with
//! [`EntityManager::create_entity_with`]: super::EntityManager::create_entity_with

use super::component::{Component, ComponentList};
use super::entity::{ComponentBitset, EntityId};
use super::storage::ComponentStorage;

/// A tuple of component types matched against entity bitsets
pub trait ComponentQuery<L: ComponentList>: 'static {
    /// Columns moved out of the manager for the duration of an iteration
    type Columns: 'static;

    /// Mutable references handed to the iteration callback
    type Item<'a>;

    /// Bits of every type in the tuple
    fn signature() -> ComponentBitset;

    /// Number of types in the tuple, duplicates included
    fn arity() -> usize;

    /// Move the queried columns out of `storage`
    fn take_columns(storage: &mut L::Storage) -> Self::Columns;

    /// Put columns taken by [`ComponentQuery::take_columns`] back
    fn restore_columns(storage: &mut L::Storage, columns: Self::Columns);

    /// Borrow the committed components of `id` from the taken columns
    fn fetch(columns: &mut Self::Columns, id: EntityId) -> Option<Self::Item<'_>>;
}

/// A tuple of component values attached together at creation
pub trait ComponentBundle<L: ComponentList> {
    /// Bits of every type in the tuple
    fn signature() -> ComponentBitset;

    /// Stage every value for the entity `id`
    fn stage(self, storage: &mut L::Storage, id: EntityId);
}

macro_rules! impl_component_tuple {
    ($($ty:ident $var:ident),+) => {
        impl<L: ComponentList, $($ty: Component<L>),+> ComponentQuery<L> for ($($ty,)+) {
            type Columns = ($(ComponentStorage<$ty>,)+);
            type Item<'a> = ($(&'a mut $ty,)+);

            fn signature() -> ComponentBitset {
                ComponentBitset::EMPTY $(.with(<$ty as Component<L>>::INDEX))+
            }

            fn arity() -> usize {
                <[&str]>::len(&[$(stringify!($ty)),+])
            }

            fn take_columns(storage: &mut L::Storage) -> Self::Columns {
                ($(std::mem::take(<$ty as Component<L>>::storage_mut(storage)),)+)
            }

            fn restore_columns(storage: &mut L::Storage, columns: Self::Columns) {
                let ($($var,)+) = columns;
                $(*<$ty as Component<L>>::storage_mut(storage) = $var;)+
            }

            fn fetch(columns: &mut Self::Columns, id: EntityId) -> Option<Self::Item<'_>> {
                let ($($var,)+) = columns;
                Some(($($var.get_mut(id)?,)+))
            }
        }

        impl<L: ComponentList, $($ty: Component<L>),+> ComponentBundle<L> for ($($ty,)+) {
            fn signature() -> ComponentBitset {
                ComponentBitset::EMPTY $(.with(<$ty as Component<L>>::INDEX))+
            }

            fn stage(self, storage: &mut L::Storage, id: EntityId) {
                let ($($var,)+) = self;
                $(<$ty as Component<L>>::storage_mut(storage).stage(id, $var);)+
            }
        }
    };
}

impl_component_tuple!(A a);
impl_component_tuple!(A a, B b);
impl_component_tuple!(A a, B b, C c);
impl_component_tuple!(A a, B b, C c, D d);
impl_component_tuple!(A a, B b, C c, D d, E e);
impl_component_tuple!(A a, B b, C c, D d, E e, F f);
impl_component_tuple!(A a, B b, C c, D d, E e, F f, G g);
impl_component_tuple!(A a, B b, C c, D d, E e, F f, G g, H h);
