//! Fixed-arity access to several component types at once.
//!
//! [`ComponentTuple`] is implemented for tuples of two to eight distinct
//! component types. It resolves the tuple's type indices in declaration order
//! and fetches one instance of every type from a single entity, which is what
//! multi-type `get`, `has`, `remove` and joins are built on. Single types are
//! handled by the plain per-type operations instead.

use crate::component::{Component, TypeIndex};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::pool::{ComponentPool, ComponentPools};
use crate::registry::TypeRegistry;

/// A tuple of component types accessed together.
pub trait ComponentTuple: 'static {
    /// The type indices of the tuple members, in declaration order.
    type Indices: AsRef<[TypeIndex]> + Copy + std::fmt::Debug;

    /// Shared references to one instance of every member.
    type Refs<'a>: Copy;

    /// Exclusive references to one instance of every member.
    type Muts<'a>;

    /// Resolve the member indices, registering members seen for the first time.
    fn register(registry: &mut TypeRegistry) -> Self::Indices;

    /// Resolve the member indices, or `None` if any member was never registered.
    fn lookup(registry: &TypeRegistry) -> Option<Self::Indices>;

    /// Member type names in declaration order.
    fn type_names() -> Vec<&'static str>;

    /// Fetch every member attached to `entity`, or `None` if any is missing.
    fn fetch<'a>(
        entity: &Entity,
        pools: &'a ComponentPools,
        indices: &Self::Indices,
    ) -> Option<Self::Refs<'a>>;

    /// Mutable variant of [`ComponentTuple::fetch`].
    ///
    /// # Panics
    ///
    /// Panics if two members share a type index.
    fn fetch_mut<'a>(
        entity: &Entity,
        pools: &'a mut ComponentPools,
        indices: &Self::Indices,
    ) -> Option<Self::Muts<'a>>;

    /// Remove every member from `entity` in declaration order, stopping at
    /// the first missing one.
    fn remove_each(
        entity: &mut Entity,
        pools: &mut ComponentPools,
        registry: &TypeRegistry,
    ) -> Result<(), EcsError>;
}

macro_rules! impl_component_tuple {
    ($arity:literal; $($name:ident $idx:tt),+) => {
        #[allow(non_snake_case)]
        impl<$($name: Component),+> ComponentTuple for ($($name,)+) {
            type Indices = [TypeIndex; $arity];
            type Refs<'a> = ($(&'a $name,)+);
            type Muts<'a> = ($(&'a mut $name,)+);

            fn register(registry: &mut TypeRegistry) -> Self::Indices {
                [$(registry.index_of::<$name>()),+]
            }

            fn lookup(registry: &TypeRegistry) -> Option<Self::Indices> {
                Some([$(registry.lookup::<$name>()?),+])
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(<$name as Component>::type_name()),+]
            }

            fn fetch<'a>(
                entity: &Entity,
                pools: &'a ComponentPools,
                indices: &Self::Indices,
            ) -> Option<Self::Refs<'a>> {
                Some(($(
                    pools
                        .pool::<$name>(indices[$idx])?
                        .get(entity.key(indices[$idx])?)?,
                )+))
            }

            fn fetch_mut<'a>(
                entity: &Entity,
                pools: &'a mut ComponentPools,
                indices: &Self::Indices,
            ) -> Option<Self::Muts<'a>> {
                let keys = [$(entity.key(indices[$idx])?),+];
                let [$($name),+] = pools.disjoint_mut(*indices)?;
                Some(($(
                    $name?
                        .as_any_mut()
                        .downcast_mut::<ComponentPool<$name>>()?
                        .get_mut(keys[$idx])?,
                )+))
            }

            fn remove_each(
                entity: &mut Entity,
                pools: &mut ComponentPools,
                registry: &TypeRegistry,
            ) -> Result<(), EcsError> {
                $(entity.remove::<$name>(pools, registry)?;)+
                Ok(())
            }
        }
    };
}

impl_component_tuple!(2; A 0, B 1);
impl_component_tuple!(3; A 0, B 1, C 2);
impl_component_tuple!(4; A 0, B 1, C 2, D 3);
impl_component_tuple!(5; A 0, B 1, C 2, D 3, E 4);
impl_component_tuple!(6; A 0, B 1, C 2, D 3, E 4, F 5);
impl_component_tuple!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_component_tuple!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
