//! Component traits and the component list declaration macro
//!
//! A program declares its component types exactly once with
//! [`component_list!`](crate::component_list). The macro assigns every type a
//! dense index (its position in the list), derives one
//! [`ComponentStorage`](super::ComponentStorage) column per type and checks
//! the list against [`MAX_COMPONENTS`](super::MAX_COMPONENTS) at compile time.
//! Listing a type twice is rejected by the compiler as a conflicting impl.

use super::storage::ComponentStorage;

/// A fixed, ordered set of component types
pub trait ComponentList: Sized + 'static {
    /// One storage column per listed component type
    type Storage: Default + 'static;

    /// Number of listed component types
    const COUNT: usize;

    /// Human-readable name of the type at `index`, for diagnostics
    fn type_name(index: usize) -> &'static str;

    /// Call `visitor.visit::<C>()` for every listed type, in declaration order
    fn visit_types<V: ComponentVisitor<Self>>(visitor: &mut V);
}

/// A component type belonging to the list `L`
///
/// Components are plain data. `Default` is the cleared value written into
/// vacated slots.
pub trait Component<L: ComponentList>: Default + 'static {
    /// Dense index of this type within `L`
    const INDEX: usize;

    /// Column holding this type
    fn storage(storage: &L::Storage) -> &ComponentStorage<Self>;

    /// Mutable column holding this type
    fn storage_mut(storage: &mut L::Storage) -> &mut ComponentStorage<Self>;

    /// Name used in log messages
    fn type_name() -> &'static str {
        L::type_name(Self::INDEX)
    }
}

/// Type-level visitor over a [`ComponentList`]
pub trait ComponentVisitor<L: ComponentList> {
    /// Visit component type `C`
    fn visit<C: Component<L>>(&mut self);
}

/// Declare the component list of a program
///
/// ```rust
/// #[derive(Debug, Default)]
/// struct Position(f32, f32);
///
/// #[derive(Debug, Default)]
/// struct Velocity(f32, f32);
///
/// starbase_engine::component_list! {
///     /// Components of the example.
///     pub struct Components, storage ComponentsStorage {
///         position: Position,
///         velocity: Velocity,
///     }
/// }
///
/// use starbase_engine::ecs::{Component, ComponentList};
/// assert_eq!(<Components as ComponentList>::COUNT, 2);
/// assert_eq!(<Velocity as Component<Components>>::INDEX, 1);
/// ```
#[macro_export]
macro_rules! component_list {
    (@impl $list:ident, $storage:ident, $index:expr; $field:ident : $ty:ty, $($rest:tt)*) => {
        impl $crate::ecs::Component<$list> for $ty {
            const INDEX: usize = $index;

            fn storage(storage: &$storage) -> &$crate::ecs::ComponentStorage<Self> {
                &storage.$field
            }

            fn storage_mut(storage: &mut $storage) -> &mut $crate::ecs::ComponentStorage<Self> {
                &mut storage.$field
            }
        }

        $crate::component_list!(@impl $list, $storage, $index + 1usize; $($rest)*);
    };

    (@impl $list:ident, $storage:ident, $index:expr;) => {};

    (
        $(#[$meta:meta])*
        $vis:vis struct $list:ident, storage $storage:ident {
            $($field:ident : $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $list;

        #[doc = concat!("Per-type component columns of [`", stringify!($list), "`].")]
        #[derive(Default)]
        $vis struct $storage {
            $($field: $crate::ecs::ComponentStorage<$ty>,)+
        }

        impl $crate::ecs::ComponentList for $list {
            type Storage = $storage;

            const COUNT: usize = <[&str]>::len(&[$(stringify!($ty)),+]);

            fn type_name(index: usize) -> &'static str {
                const NAMES: &[&str] = &[$(stringify!($ty)),+];
                NAMES.get(index).copied().unwrap_or("<unknown>")
            }

            fn visit_types<V: $crate::ecs::ComponentVisitor<Self>>(visitor: &mut V) {
                $(visitor.visit::<$ty>();)+
            }
        }

        const _: () = assert!(
            <$list as $crate::ecs::ComponentList>::COUNT <= $crate::ecs::MAX_COMPONENTS,
            "component list exceeds MAX_COMPONENTS"
        );

        $crate::component_list!(@impl $list, $storage, 0usize; $($field: $ty,)+);
    };
}
