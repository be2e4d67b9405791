//! Entity identifiers and the per-entity composition map.
//!
//! An [`Entity`] owns no component data itself. It records, for each attached
//! component type, the [`ComponentKey`] of the instance living in the shared
//! [`ComponentPools`]. At most one instance per type can be attached.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::component::{Component, ComponentKey, TypeIndex};
use crate::error::EcsError;
use crate::pool::ComponentPools;
use crate::registry::TypeRegistry;
use crate::tuple::ComponentTuple;

/// Identifier of one entity.
///
/// Drawn from a single counter shared by every world in the process, so an
/// id is never reused and never collides across worlds. `0` is reserved as
/// the null id for components that are not attached to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    pub const NULL: EntityId = EntityId(0);

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// `true` for [`EntityId::NULL`], which the allocator never returns.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity #{}", self.0)
    }
}

/// Process-wide source of entity identifiers. Starts above zero.
static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates monotonically increasing entity identifiers.
///
/// Identifiers are drawn from one process-wide counter, so two worlds never
/// hand out the same identifier. Each allocator additionally counts how many
/// identifiers it has handed out itself.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    allocated: u64,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh entity identifier.
    pub fn allocate(&mut self) -> EntityId {
        self.allocated += 1;
        EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the number of identifiers this allocator has handed out.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.allocated
    }
}

/// Composition root: the sparse map from component type to attached instance.
///
/// Every operation that touches component data takes the shared
/// [`ComponentPools`] (and the [`TypeRegistry`] that maps types to indices)
/// explicitly. Mutating operations fail with an [`EcsError`] when the
/// caller's assumption about the current composition is wrong; reads never
/// fail and report absence as `None` / `false`.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    /// Ordered by type index, which fixes the cascade order on destruction.
    components: BTreeMap<TypeIndex, ComponentKey>,
}

impl Entity {
    /// Create an entity with no components attached.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            components: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Number of attached components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Attached type indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = TypeIndex> + '_ {
        self.components.keys().copied()
    }

    /// Handle of the instance attached under `index`.
    #[must_use]
    pub fn key(&self, index: TypeIndex) -> Option<ComponentKey> {
        self.components.get(&index).copied()
    }

    #[must_use]
    pub fn contains(&self, index: TypeIndex) -> bool {
        self.components.contains_key(&index)
    }

    /// Short-circuiting membership test over several type indices.
    #[must_use]
    pub fn contains_all(&self, indices: &[TypeIndex]) -> bool {
        indices.iter().all(|index| self.contains(*index))
    }

    /// Construct a `T` from `args` and attach it.
    ///
    /// Fails with [`EcsError::DuplicateComponent`] if a `T` is already
    /// attached; nothing is constructed in that case.
    pub fn add<T: Component>(
        &mut self,
        pools: &mut ComponentPools,
        registry: &mut TypeRegistry,
        args: T::Args,
    ) -> Result<ComponentKey, EcsError> {
        let index = registry.index_of::<T>();
        if self.contains(index) {
            return Err(EcsError::DuplicateComponent {
                entity: self.id,
                component: T::type_name(),
            });
        }

        let key = pools.create::<T>(index, args);
        self.components.insert(index, key);
        pools.set_owner(index, key, Some(self.id));
        trace!(entity = %self.id, component = T::type_name(), "added component");
        Ok(key)
    }

    /// Detach and destroy the attached `T`.
    ///
    /// Fails with [`EcsError::MissingComponent`] if no `T` is attached.
    pub fn remove<T: Component>(
        &mut self,
        pools: &mut ComponentPools,
        registry: &TypeRegistry,
    ) -> Result<(), EcsError> {
        let key = registry
            .lookup::<T>()
            .and_then(|index| self.components.remove(&index).map(|key| (index, key)));
        let Some((index, key)) = key else {
            return Err(EcsError::MissingComponent {
                entity: self.id,
                component: T::type_name(),
            });
        };

        pools.set_owner(index, key, None);
        pools.remove(index, Some(key));
        trace!(entity = %self.id, component = T::type_name(), "removed component");
        Ok(())
    }

    /// Remove every type of `Q` in declaration order.
    ///
    /// Not atomic: when a later type is missing the call fails with
    /// [`EcsError::MissingComponent`] after the earlier removals already
    /// took effect.
    pub fn remove_many<Q: ComponentTuple>(
        &mut self,
        pools: &mut ComponentPools,
        registry: &TypeRegistry,
    ) -> Result<(), EcsError> {
        Q::remove_each(self, pools, registry)
    }

    /// Install a fresh `T` built from `args`, destroying the attached one if
    /// there is one. Behaves exactly like [`Entity::add`] when no `T` is
    /// attached, and never fails.
    pub fn replace<T: Component>(
        &mut self,
        pools: &mut ComponentPools,
        registry: &mut TypeRegistry,
        args: T::Args,
    ) -> ComponentKey {
        let index = registry.index_of::<T>();
        let key = pools.create::<T>(index, args);
        if let Some(previous) = self.components.insert(index, key) {
            pools.set_owner(index, previous, None);
            pools.remove(index, Some(previous));
        }
        pools.set_owner(index, key, Some(self.id));
        trace!(entity = %self.id, component = T::type_name(), "replaced component");
        key
    }

    /// The attached `T`, or `None`.
    #[must_use]
    pub fn get<'p, T: Component>(
        &self,
        pools: &'p ComponentPools,
        registry: &TypeRegistry,
    ) -> Option<&'p T> {
        let index = registry.lookup::<T>()?;
        pools.pool::<T>(index)?.get(self.key(index)?)
    }

    pub fn get_mut<'p, T: Component>(
        &self,
        pools: &'p mut ComponentPools,
        registry: &TypeRegistry,
    ) -> Option<&'p mut T> {
        let index = registry.lookup::<T>()?;
        let key = self.key(index)?;
        pools.pool_mut::<T>(index)?.get_mut(key)
    }

    /// All types of `Q` at once, or `None` unless every one is attached.
    ///
    /// All-or-nothing: a type that is attached on its own is still not
    /// returned when another type of `Q` is missing.
    #[must_use]
    pub fn get_many<'p, Q: ComponentTuple>(
        &self,
        pools: &'p ComponentPools,
        registry: &TypeRegistry,
    ) -> Option<Q::Refs<'p>> {
        let indices = Q::lookup(registry)?;
        if !self.contains_all(indices.as_ref()) {
            return None;
        }
        Q::fetch(self, pools, &indices)
    }

    /// Mutable all-or-nothing access to every type of `Q`.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names the same component type twice.
    pub fn get_many_mut<'p, Q: ComponentTuple>(
        &self,
        pools: &'p mut ComponentPools,
        registry: &TypeRegistry,
    ) -> Option<Q::Muts<'p>> {
        let indices = Q::lookup(registry)?;
        if !self.contains_all(indices.as_ref()) {
            return None;
        }
        Q::fetch_mut(self, pools, &indices)
    }

    #[must_use]
    pub fn has<T: Component>(&self, registry: &TypeRegistry) -> bool {
        registry.lookup::<T>().is_some_and(|index| self.contains(index))
    }

    /// `true` only if every type of `Q` is attached.
    #[must_use]
    pub fn has_all<Q: ComponentTuple>(&self, registry: &TypeRegistry) -> bool {
        Q::lookup(registry).is_some_and(|indices| self.contains_all(indices.as_ref()))
    }

    /// Handle of the attached `T`.
    #[must_use]
    pub fn handle<T: Component>(&self, registry: &TypeRegistry) -> Option<ComponentKey> {
        self.key(registry.lookup::<T>()?)
    }

    /// Destroy every attached component in ascending type-index order.
    ///
    /// Returns the number of components destroyed. The entity is left empty
    /// and may be reused or dropped.
    pub fn destroy(&mut self, pools: &mut ComponentPools) -> usize {
        let components = std::mem::take(&mut self.components);
        let count = components.len();
        for (index, key) in components {
            pools.set_owner(index, key, None);
            pools.remove(index, Some(key));
        }
        trace!(entity = %self.id, count, "destroyed components");
        count
    }
}
