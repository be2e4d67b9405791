//! World state: the type registry, every component pool and the directory of
//! live entities.
//!
//! The [`World`] is the sole owner of entities. Callers reach an entity
//! through short-lived handles: [`EntityRef`] for reads and [`EntityMut`] for
//! composition changes. Both borrow the world, so no query can be in flight
//! while a handle mutates pools.

use std::collections::HashMap;

use compo_component::{
    Component, ComponentKey, ComponentPools, ComponentTuple, EcsError, Entity, EntityAllocator,
    EntityId, TypeIndex, TypeRegistry,
};
use tracing::{debug, trace};

use crate::config::AdminConfig;

/// Entity directory and component storage.
#[derive(Debug, Default)]
pub struct World {
    pub(crate) registry: TypeRegistry,
    pub(crate) pools: ComponentPools,
    pub(crate) entities: HashMap<EntityId, Entity>,
    allocator: EntityAllocator,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty world sized according to `config`.
    #[must_use]
    pub fn with_config(config: &AdminConfig) -> Self {
        Self {
            registry: TypeRegistry::new(),
            pools: ComponentPools::with_pool_capacity(config.pool_capacity),
            entities: HashMap::with_capacity(config.entity_capacity),
            allocator: EntityAllocator::new(),
        }
    }

    // -- Entity lifecycle --

    /// Allocate the next entity identifier and register an empty entity.
    pub fn create_entity(&mut self) -> EntityMut<'_> {
        let id = self.allocator.allocate();
        let entity = self.entities.entry(id).or_insert_with(|| Entity::new(id));
        debug!(entity = %id, "created entity");
        EntityMut {
            entity,
            pools: &mut self.pools,
            registry: &mut self.registry,
        }
    }

    /// Destroy an entity and, first, every component attached to it.
    ///
    /// Returns `false` (and does nothing) if the entity does not exist.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let Some(mut entity) = self.entities.remove(&id) else {
            trace!(entity = %id, "destroy of unknown entity ignored");
            return false;
        };
        let components = entity.destroy(&mut self.pools);
        debug!(entity = %id, components, "destroyed entity");
        true
    }

    /// Read access to a live entity.
    #[must_use]
    pub fn find_entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        let entity = self.entities.get(&id)?;
        Some(EntityRef {
            entity,
            pools: &self.pools,
            registry: &self.registry,
        })
    }

    /// Write access to a live entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        let entity = self.entities.get_mut(&id)?;
        Some(EntityMut {
            entity,
            pools: &mut self.pools,
            registry: &mut self.registry,
        })
    }

    #[must_use]
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Returns the count of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Identifiers of all live entities, in no particular order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    // -- Components --

    /// Number of live `T` instances across all entities.
    #[must_use]
    pub fn count<T: Component>(&self) -> usize {
        self.registry
            .lookup::<T>()
            .map_or(0, |index| self.pools.len_of(index))
    }

    /// The entity currently owning the `T` behind `key`.
    ///
    /// `None` once that instance has been destroyed, even if its storage
    /// slot has since been reused.
    #[must_use]
    pub fn owner_of<T: Component>(&self, key: ComponentKey) -> Option<EntityId> {
        let index = self.registry.lookup::<T>()?;
        self.pools.pool::<T>(index)?.owner(key)
    }

    /// Assign `T` its type index now rather than on first use.
    pub fn register<T: Component>(&mut self) -> TypeIndex {
        self.registry.index_of::<T>()
    }

    /// Assign every member of `Q` its type index now.
    pub fn register_all<Q: ComponentTuple>(&mut self) -> Q::Indices {
        Q::register(&mut self.registry)
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Raw per-type pool access for query code built outside this crate.
    #[must_use]
    pub fn pools(&self) -> &ComponentPools {
        &self.pools
    }
}

/// Read-only handle to one live entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'w> {
    entity: &'w Entity,
    pools: &'w ComponentPools,
    registry: &'w TypeRegistry,
}

impl<'w> EntityRef<'w> {
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.entity.id()
    }

    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&'w T> {
        self.entity.get::<T>(self.pools, self.registry)
    }

    /// All-or-nothing access to every member of `Q`.
    #[must_use]
    pub fn get_many<Q: ComponentTuple>(&self) -> Option<Q::Refs<'w>> {
        self.entity.get_many::<Q>(self.pools, self.registry)
    }

    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.entity.has::<T>(self.registry)
    }

    #[must_use]
    pub fn has_all<Q: ComponentTuple>(&self) -> bool {
        self.entity.has_all::<Q>(self.registry)
    }

    #[must_use]
    pub fn handle<T: Component>(&self) -> Option<ComponentKey> {
        self.entity.handle::<T>(self.registry)
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.entity.component_count()
    }
}

/// Mutable handle to one live entity.
///
/// Composition changes return `&mut Self` so they can be chained:
///
/// ```rust
/// # use compo_admin::{Component, World};
/// # #[derive(Default)] struct Position(f32, f32, f32);
/// # impl Component for Position {
/// #     type Args = (f32, f32, f32);
/// #     fn reset(&mut self, (x, y, z): Self::Args) { *self = Position(x, y, z); }
/// # }
/// # #[derive(Default)] struct Health(f32, f32);
/// # impl Component for Health {
/// #     type Args = (f32, f32);
/// #     fn reset(&mut self, (hp, mana): Self::Args) { *self = Health(hp, mana); }
/// # }
/// # fn main() -> Result<(), compo_admin::EcsError> {
/// let mut world = World::new();
/// world
///     .create_entity()
///     .add::<Position>((1.0, 2.0, 3.0))?
///     .add::<Health>((50.0, 70.0))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EntityMut<'w> {
    entity: &'w mut Entity,
    pools: &'w mut ComponentPools,
    registry: &'w mut TypeRegistry,
}

impl EntityMut<'_> {
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.entity.id()
    }

    /// Attach a new `T` built from `args`.
    ///
    /// Fails with [`EcsError::DuplicateComponent`] if a `T` is already attached.
    pub fn add<T: Component>(&mut self, args: T::Args) -> Result<&mut Self, EcsError> {
        self.entity.add::<T>(self.pools, self.registry, args)?;
        Ok(self)
    }

    /// Detach and destroy the attached `T`.
    ///
    /// Fails with [`EcsError::MissingComponent`] if no `T` is attached.
    pub fn remove<T: Component>(&mut self) -> Result<&mut Self, EcsError> {
        self.entity.remove::<T>(self.pools, self.registry)?;
        Ok(self)
    }

    /// Remove every member of `Q` in order. Not atomic: removals before the
    /// first missing member stay applied.
    pub fn remove_many<Q: ComponentTuple>(&mut self) -> Result<&mut Self, EcsError> {
        self.entity.remove_many::<Q>(self.pools, self.registry)?;
        Ok(self)
    }

    /// Install a new `T` built from `args`, destroying any attached one.
    pub fn replace<T: Component>(&mut self, args: T::Args) -> &mut Self {
        self.entity.replace::<T>(self.pools, self.registry, args);
        self
    }

    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.entity.get::<T>(self.pools, self.registry)
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.entity.get_mut::<T>(self.pools, self.registry)
    }

    /// All-or-nothing access to every member of `Q`.
    #[must_use]
    pub fn get_many<Q: ComponentTuple>(&self) -> Option<Q::Refs<'_>> {
        self.entity.get_many::<Q>(self.pools, self.registry)
    }

    pub fn get_many_mut<Q: ComponentTuple>(&mut self) -> Option<Q::Muts<'_>> {
        self.entity.get_many_mut::<Q>(self.pools, self.registry)
    }

    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.entity.has::<T>(self.registry)
    }

    #[must_use]
    pub fn has_all<Q: ComponentTuple>(&self) -> bool {
        self.entity.has_all::<Q>(self.registry)
    }

    #[must_use]
    pub fn handle<T: Component>(&self) -> Option<ComponentKey> {
        self.entity.handle::<T>(self.registry)
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.entity.component_count()
    }

    /// Downgrade to a read-only handle.
    #[must_use]
    pub fn as_readonly(&self) -> EntityRef<'_> {
        EntityRef {
            entity: self.entity,
            pools: self.pools,
            registry: self.registry,
        }
    }
}
