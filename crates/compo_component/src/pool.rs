//! Dense per-type component storage.
//!
//! A [`ComponentPool`] keeps every live instance of one component type in a
//! contiguous array. The array order carries no meaning: removal swaps the
//! doomed slot with the last one and pops it, which moves exactly one
//! survivor. Instances are addressed by [`ComponentKey`] handles that go
//! through a generation-checked sparse index, so the move is invisible to
//! anyone holding a key.
//!
//! [`ComponentPools`] is the type-erased collection of all pools, indexed by
//! [`TypeIndex`]. The concrete pool type is recovered by downcasting, which
//! validates the runtime type tag instead of trusting the index alone.

use std::any::Any;

use slotmap::SlotMap;

use crate::component::{Component, ComponentKey, TypeIndex};
use crate::entity::EntityId;

/// One stored component together with its bookkeeping.
#[derive(Debug)]
struct Slot<T> {
    value: T,
    key: ComponentKey,
    /// Back-reference to the owning entity. `Some` exactly while attached.
    owner: Option<EntityId>,
}

/// Dense storage for every live instance of component type `T`.
#[derive(Debug)]
pub struct ComponentPool<T: Component> {
    dense: Vec<Slot<T>>,
    /// Maps a handle to its current position in `dense`.
    sparse: SlotMap<ComponentKey, usize>,
}

impl<T: Component> ComponentPool<T> {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty pool with room for `capacity` instances.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(capacity),
            sparse: SlotMap::with_capacity_and_key(capacity),
        }
    }

    /// Construct a new instance, reinitialise it with `args` and append it.
    ///
    /// The instance starts detached; the caller attaches it with
    /// [`ComponentPool::set_owner`].
    pub fn create(&mut self, args: T::Args) -> ComponentKey {
        let mut value = T::default();
        value.reset(args);

        let position = self.dense.len();
        let key = self.sparse.insert(position);
        self.dense.push(Slot {
            value,
            key,
            owner: None,
        });
        key
    }

    /// Destroy the instance behind `key`.
    ///
    /// The slot is swapped with the last one and popped, so the previously
    /// last instance changes position. Returns `false` if `key` does not name
    /// a live instance of this pool, which is a caller-contract violation.
    pub fn remove(&mut self, key: ComponentKey) -> bool {
        let Some(position) = self.sparse.remove(key) else {
            debug_assert!(false, "{} handle is not in its pool", T::type_name());
            return false;
        };

        let removed = self.dense.swap_remove(position);
        if let Some(moved) = self.dense.get(position)
            && let Some(entry) = self.sparse.get_mut(moved.key)
        {
            *entry = position;
        }
        drop(removed);
        true
    }

    /// Set or clear the owner back-reference of a live instance.
    pub fn set_owner(&mut self, key: ComponentKey, owner: Option<EntityId>) -> bool {
        match self.slot_mut(key) {
            Some(slot) => {
                slot.owner = owner;
                true
            }
            None => false,
        }
    }

    /// Returns the entity that currently owns the instance behind `key`.
    #[must_use]
    pub fn owner(&self, key: ComponentKey) -> Option<EntityId> {
        self.slot(key).and_then(|slot| slot.owner)
    }

    /// Returns `true` if `key` names a live instance of this pool.
    #[must_use]
    pub fn contains(&self, key: ComponentKey) -> bool {
        self.sparse.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: ComponentKey) -> Option<&T> {
        self.slot(key).map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, key: ComponentKey) -> Option<&mut T> {
        self.slot_mut(key).map(|slot| &mut slot.value)
    }

    /// Returns the instance stored at `position` in storage order.
    #[must_use]
    pub fn get_at(&self, position: usize) -> Option<&T> {
        self.dense.get(position).map(|slot| &slot.value)
    }

    /// Returns the owner of the instance stored at `position`.
    #[must_use]
    pub fn owner_at(&self, position: usize) -> Option<EntityId> {
        self.dense.get(position).and_then(|slot| slot.owner)
    }

    /// Returns the handle of the instance stored at `position`.
    #[must_use]
    pub fn key_at(&self, position: usize) -> Option<ComponentKey> {
        self.dense.get(position).map(|slot| slot.key)
    }

    /// Returns the number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Iterate over all live instances in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.dense.iter().map(|slot| &slot.value)
    }

    /// Iterate mutably over all live instances in storage order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.dense.iter_mut().map(|slot| &mut slot.value)
    }

    fn slot(&self, key: ComponentKey) -> Option<&Slot<T>> {
        let position = *self.sparse.get(key)?;
        self.dense.get(position)
    }

    fn slot_mut(&mut self, key: ComponentKey) -> Option<&mut Slot<T>> {
        let position = *self.sparse.get(key)?;
        self.dense.get_mut(position)
    }
}

impl<T: Component> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object-safe view of a [`ComponentPool`] whose component type is erased.
pub trait ErasedPool: Any {
    /// Number of live instances.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy the instance behind `key`, see [`ComponentPool::remove`].
    fn remove(&mut self, key: ComponentKey) -> bool;

    fn set_owner(&mut self, key: ComponentKey, owner: Option<EntityId>) -> bool;

    fn owner(&self, key: ComponentKey) -> Option<EntityId>;

    fn owner_at(&self, position: usize) -> Option<EntityId>;

    /// Name of the stored component type.
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn len(&self) -> usize {
        ComponentPool::len(self)
    }

    fn remove(&mut self, key: ComponentKey) -> bool {
        ComponentPool::remove(self, key)
    }

    fn set_owner(&mut self, key: ComponentKey, owner: Option<EntityId>) -> bool {
        ComponentPool::set_owner(self, key, owner)
    }

    fn owner(&self, key: ComponentKey) -> Option<EntityId> {
        ComponentPool::owner(self, key)
    }

    fn owner_at(&self, position: usize) -> Option<EntityId> {
        ComponentPool::owner_at(self, position)
    }

    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Every component pool, indexed by [`TypeIndex`].
///
/// Pools are created on the first [`ComponentPools::create`] for their index.
/// A type index with no pool yet behaves like an empty pool for every read.
#[derive(Default)]
pub struct ComponentPools {
    pools: Vec<Option<Box<dyn ErasedPool>>>,
    /// Capacity reserved in each newly created pool.
    pool_capacity: usize,
}

impl ComponentPools {
    /// Create an empty pool set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty pool set whose pools reserve `pool_capacity` slots
    /// when they are first created.
    #[must_use]
    pub fn with_pool_capacity(pool_capacity: usize) -> Self {
        Self {
            pools: Vec::new(),
            pool_capacity,
        }
    }

    /// Construct a `T` from `args` in the pool for `index`, creating the pool
    /// on first use.
    ///
    /// # Panics
    ///
    /// Panics if `index` already holds a pool of a different component type,
    /// which means the index did not come from the registry that owns `T`.
    pub fn create<T: Component>(&mut self, index: TypeIndex, args: T::Args) -> ComponentKey {
        self.pool_or_insert::<T>(index).create(args)
    }

    /// Destroy the instance behind `key` in the pool for `index`.
    ///
    /// A `None` handle is a no-op. Returns `true` if an instance was destroyed.
    pub fn remove(&mut self, index: TypeIndex, key: Option<ComponentKey>) -> bool {
        let Some(key) = key else {
            return false;
        };
        self.erased_mut(index).is_some_and(|pool| pool.remove(key))
    }

    /// Set or clear the owner back-reference of a live instance.
    pub fn set_owner(&mut self, index: TypeIndex, key: ComponentKey, owner: Option<EntityId>) -> bool {
        self.erased_mut(index).is_some_and(|pool| pool.set_owner(key, owner))
    }

    /// Typed access to the pool for `index`.
    #[must_use]
    pub fn pool<T: Component>(&self, index: TypeIndex) -> Option<&ComponentPool<T>> {
        self.erased(index)?.as_any().downcast_ref()
    }

    /// Typed mutable access to the pool for `index`.
    pub fn pool_mut<T: Component>(&mut self, index: TypeIndex) -> Option<&mut ComponentPool<T>> {
        self.erased_mut(index)?.as_any_mut().downcast_mut()
    }

    /// Type-erased access to the pool for `index`.
    #[must_use]
    pub fn erased(&self, index: TypeIndex) -> Option<&dyn ErasedPool> {
        self.pools.get(index.as_usize())?.as_deref()
    }

    pub fn erased_mut(&mut self, index: TypeIndex) -> Option<&mut (dyn ErasedPool + 'static)> {
        match self.pools.get_mut(index.as_usize()) {
            Some(Some(pool)) => Some(pool.as_mut()),
            _ => None,
        }
    }

    /// Number of live instances in the pool for `index`; `0` if it has no pool.
    #[must_use]
    pub fn len_of(&self, index: TypeIndex) -> usize {
        self.erased(index).map_or(0, |pool| pool.len())
    }

    /// Number of pools created so far.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.iter().filter(|pool| pool.is_some()).count()
    }

    /// Mutable access to several distinct pools at once.
    ///
    /// Returns `None` if an index lies past every pool created so far. An
    /// index inside that range whose pool does not exist yet comes back as a
    /// `None` entry.
    ///
    /// # Panics
    ///
    /// Panics if `indices` contains the same index twice.
    pub fn disjoint_mut<const N: usize>(
        &mut self,
        indices: [TypeIndex; N],
    ) -> Option<[Option<&mut (dyn ErasedPool + 'static)>; N]> {
        for (i, index) in indices.iter().enumerate() {
            assert!(
                !indices[i + 1..].contains(index),
                "component types accessed together must be distinct ({index} repeats)"
            );
        }

        let slots = self
            .pools
            .get_disjoint_mut(indices.map(TypeIndex::as_usize))
            .ok()?;
        Some(slots.map(|slot| slot.as_deref_mut()))
    }

    fn pool_or_insert<T: Component>(&mut self, index: TypeIndex) -> &mut ComponentPool<T> {
        let position = index.as_usize();
        if position >= self.pools.len() {
            self.pools.resize_with(position + 1, || None);
        }
        let capacity = self.pool_capacity;
        let pool = self.pools[position]
            .get_or_insert_with(|| Box::new(ComponentPool::<T>::with_capacity(capacity)));
        let stored = pool.type_name();
        match pool.as_any_mut().downcast_mut() {
            Some(pool) => pool,
            None => panic!("{index} holds {stored} components, not {}", T::type_name()),
        }
    }
}

impl std::fmt::Debug for ComponentPools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.pools.iter().enumerate().filter_map(|(i, pool)| {
                pool.as_ref().map(|pool| ((i, pool.type_name()), pool.len()))
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Score {
        value: i32,
    }

    impl Component for Score {
        type Args = i32;

        fn reset(&mut self, value: i32) {
            self.value = value;
        }
    }

    #[derive(Debug, Default)]
    struct Tag;

    impl Component for Tag {
        type Args = ();
        fn reset(&mut self, (): ()) {}
    }

    #[test]
    fn test_create_applies_reset() {
        let mut pool = ComponentPool::<Score>::new();
        let key = pool.create(7);
        assert_eq!(pool.get(key), Some(&Score { value: 7 }));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.owner(key), None);
    }

    #[test]
    fn test_remove_swaps_last_into_hole() {
        let mut pool = ComponentPool::<Score>::new();
        let a = pool.create(1);
        let b = pool.create(2);
        let c = pool.create(3);

        assert!(pool.remove(a));
        assert_eq!(pool.len(), 2);
        // The last instance moved into the vacated position...
        assert_eq!(pool.get_at(0), Some(&Score { value: 3 }));
        assert_eq!(pool.key_at(0), Some(c));
        // ...but every surviving handle still resolves to its own instance.
        assert_eq!(pool.get(b), Some(&Score { value: 2 }));
        assert_eq!(pool.get(c), Some(&Score { value: 3 }));
    }

    #[test]
    fn test_remove_last_element() {
        let mut pool = ComponentPool::<Score>::new();
        let a = pool.create(1);
        let b = pool.create(2);
        assert!(pool.remove(b));
        assert_eq!(pool.get(a), Some(&Score { value: 1 }));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_stale_handle_resolves_to_nothing() {
        let mut pool = ComponentPool::<Score>::new();
        let old = pool.create(1);
        assert!(pool.remove(old));
        let new = pool.create(2);
        assert_ne!(old, new);
        assert!(!pool.contains(old));
        assert_eq!(pool.get(old), None);
        assert_eq!(pool.get(new), Some(&Score { value: 2 }));
    }

    #[test]
    fn test_owner_back_reference() {
        let mut pool = ComponentPool::<Score>::new();
        let key = pool.create(1);
        let owner = EntityId::from_raw(9);
        assert!(pool.set_owner(key, Some(owner)));
        assert_eq!(pool.owner(key), Some(owner));
        assert_eq!(pool.owner_at(0), Some(owner));
        pool.remove(key);
        assert_eq!(pool.owner(key), None);
        assert!(!pool.set_owner(key, Some(owner)));
    }

    #[test]
    fn test_pools_remove_null_handle_is_noop() {
        let mut pools = ComponentPools::new();
        let index = TypeIndex(0);
        pools.create::<Score>(index, 1);
        assert!(!pools.remove(index, None));
        assert_eq!(pools.len_of(index), 1);
    }

    #[test]
    fn test_pools_typed_access_checks_type() {
        let mut pools = ComponentPools::new();
        let score = TypeIndex(0);
        let tag = TypeIndex(2);
        let key = pools.create::<Score>(score, 5);
        pools.create::<Tag>(tag, ());

        assert_eq!(pools.pool::<Score>(score).and_then(|p| p.get(key)), Some(&Score { value: 5 }));
        assert!(pools.pool::<Tag>(score).is_none());
        assert!(pools.pool::<Score>(TypeIndex(1)).is_none());
        assert_eq!(pools.len_of(TypeIndex(1)), 0);
        assert_eq!(pools.pool_count(), 2);
    }

    #[test]
    fn test_disjoint_mut_returns_requested_order() {
        let mut pools = ComponentPools::new();
        pools.create::<Score>(TypeIndex(0), 1);
        pools.create::<Tag>(TypeIndex(1), ());
        pools.create::<Tag>(TypeIndex(1), ());

        let [tags, scores] = pools.disjoint_mut([TypeIndex(1), TypeIndex(0)]).unwrap();
        assert_eq!(tags.map(|pool| pool.len()), Some(2));
        assert_eq!(scores.map(|pool| pool.len()), Some(1));
    }

    #[test]
    fn test_disjoint_mut_missing_pool() {
        let mut pools = ComponentPools::new();
        pools.create::<Score>(TypeIndex(0), 1);
        pools.create::<Tag>(TypeIndex(2), ());
        assert!(pools.disjoint_mut([TypeIndex(0), TypeIndex(4)]).is_none());

        let [score, gap, tag] = pools
            .disjoint_mut([TypeIndex(0), TypeIndex(1), TypeIndex(2)])
            .unwrap();
        assert!(score.is_some());
        assert!(gap.is_none());
        assert!(tag.is_some());
    }

    #[test]
    #[should_panic(expected = "must be distinct")]
    fn test_disjoint_mut_rejects_duplicates() {
        let mut pools = ComponentPools::new();
        pools.create::<Score>(TypeIndex(0), 1);
        let _ = pools.disjoint_mut([TypeIndex(0), TypeIndex(0)]);
    }

    #[test]
    fn test_with_pool_capacity() {
        let mut pools = ComponentPools::with_pool_capacity(16);
        pools.create::<Score>(TypeIndex(0), 1);
        assert_eq!(pools.len_of(TypeIndex(0)), 1);
    }
}
