//! Component queries and multi-type joins.
//!
//! A single-type query walks one pool densely. A join over `(A, B, ..)`
//! walks the smallest pool among its members (ties go to the earliest
//! member), resolves each instance's owner and yields the members of every
//! owner that carries all of them. Output follows the driver pool's storage
//! order, which removals may permute.
//!
//! Iterators borrow the [`World`], so the composition they walk cannot change
//! underneath them.

use std::collections::HashMap;

use compo_component::{
    Component, ComponentPool, ComponentPools, ComponentTuple, Entity, EntityId, TypeIndex,
};
use tracing::trace;

use crate::world::World;

/// A filter over one joined tuple of components.
///
/// Implemented for every `Fn(&A, &B, ..) -> bool` of matching arity.
pub trait JoinPredicate<Q: ComponentTuple> {
    fn test(&self, items: &Q::Refs<'_>) -> bool;
}

/// A mutating visitor over one joined tuple of components.
///
/// Implemented for every `FnMut(&mut A, &mut B, ..)` of matching arity.
pub trait JoinVisitor<Q: ComponentTuple> {
    fn visit(&mut self, items: Q::Muts<'_>);
}

macro_rules! impl_join_fns {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($name: Component,)+ Func> JoinPredicate<($($name,)+)> for Func
        where
            Func: Fn($(&$name),+) -> bool,
        {
            fn test(&self, items: &<($($name,)+) as ComponentTuple>::Refs<'_>) -> bool {
                let ($($name,)+) = *items;
                (self)($($name),+)
            }
        }

        #[allow(non_snake_case)]
        impl<$($name: Component,)+ Func> JoinVisitor<($($name,)+)> for Func
        where
            Func: FnMut($(&mut $name),+),
        {
            fn visit(&mut self, items: <($($name,)+) as ComponentTuple>::Muts<'_>) {
                let ($($name,)+) = items;
                (self)($($name),+)
            }
        }
    };
}

impl_join_fns!(A, B);
impl_join_fns!(A, B, C);
impl_join_fns!(A, B, C, D);
impl_join_fns!(A, B, C, D, E);
impl_join_fns!(A, B, C, D, E, F);
impl_join_fns!(A, B, C, D, E, F, G);
impl_join_fns!(A, B, C, D, E, F, G, H);

/// Pick the pool a join iterates: the smallest, earliest member on ties.
///
/// Returns `None` for an empty index list.
#[must_use]
pub fn select_driver(pools: &ComponentPools, indices: &[TypeIndex]) -> Option<TypeIndex> {
    indices
        .iter()
        .enumerate()
        .min_by_key(|&(position, &index)| (pools.len_of(index), position))
        .map(|(_, &index)| index)
}

// -- Single-type queries --

/// Iterator over every live `T`, optionally filtered.
pub struct ComponentIter<'w, T: Component> {
    pool: Option<&'w ComponentPool<T>>,
    cursor: usize,
    predicate: Option<Box<dyn Fn(&T) -> bool + 'w>>,
}

impl<'w, T: Component> ComponentIter<'w, T> {
    fn new(world: &'w World, predicate: Option<Box<dyn Fn(&T) -> bool + 'w>>) -> Self {
        let pool = world
            .registry
            .lookup::<T>()
            .and_then(|index| world.pools.pool::<T>(index));
        Self {
            pool,
            cursor: 0,
            predicate,
        }
    }

    /// Yield the owning entity alongside each component.
    #[must_use]
    pub fn with_owner(self) -> ComponentOwners<'w, T> {
        ComponentOwners(self)
    }

    fn next_entry(&mut self) -> Option<(EntityId, &'w T)> {
        let pool = self.pool?;
        while self.cursor < pool.len() {
            let position = self.cursor;
            self.cursor += 1;
            let Some(component) = pool.get_at(position) else {
                break;
            };
            if self.predicate.as_ref().is_none_or(|predicate| predicate(component)) {
                let owner = pool.owner_at(position).unwrap_or(EntityId::NULL);
                return Some((owner, component));
            }
        }
        None
    }
}

impl<'w, T: Component> Iterator for ComponentIter<'w, T> {
    type Item = &'w T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(|(_, component)| component)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pool.map_or(0, |pool| pool.len().saturating_sub(self.cursor));
        match self.predicate {
            Some(_) => (0, Some(remaining)),
            None => (remaining, Some(remaining)),
        }
    }
}

/// [`ComponentIter`] yielding `(owner, component)` pairs.
pub struct ComponentOwners<'w, T: Component>(ComponentIter<'w, T>);

impl<'w, T: Component> Iterator for ComponentOwners<'w, T> {
    type Item = (EntityId, &'w T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_entry()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

// -- Joins --

struct JoinPlan<Q: ComponentTuple> {
    indices: Q::Indices,
    driver: TypeIndex,
}

impl<Q: ComponentTuple> JoinPlan<Q> {
    /// `None` when a member was never registered, so nothing can match.
    fn new(world: &World) -> Option<Self> {
        let indices = Q::lookup(&world.registry)?;
        let driver = select_driver(&world.pools, indices.as_ref())?;
        Some(Self { indices, driver })
    }
}

/// Iterator over every entity carrying all members of `Q`, yielding one
/// reference to each member.
pub struct JoinIter<'w, Q: ComponentTuple> {
    entities: &'w HashMap<EntityId, Entity>,
    pools: &'w ComponentPools,
    plan: Option<JoinPlan<Q>>,
    cursor: usize,
    predicate: Option<Box<dyn JoinPredicate<Q> + 'w>>,
}

impl<'w, Q: ComponentTuple> JoinIter<'w, Q> {
    fn new(world: &'w World, predicate: Option<Box<dyn JoinPredicate<Q> + 'w>>) -> Self {
        let plan = JoinPlan::new(world);
        if let Some(plan) = &plan {
            trace!(
                members = ?Q::type_names(),
                driver = %plan.driver,
                candidates = world.pools.len_of(plan.driver),
                "planned join"
            );
        }
        Self {
            entities: &world.entities,
            pools: &world.pools,
            plan,
            cursor: 0,
            predicate,
        }
    }

    /// Yield the owning entity alongside each tuple.
    #[must_use]
    pub fn with_owner(self) -> JoinOwners<'w, Q> {
        JoinOwners(self)
    }

    fn next_entry(&mut self) -> Option<(EntityId, Q::Refs<'w>)> {
        let plan = self.plan.as_ref()?;
        let driver = self.pools.erased(plan.driver)?;
        while self.cursor < driver.len() {
            let position = self.cursor;
            self.cursor += 1;

            let Some(entity) = driver
                .owner_at(position)
                .and_then(|owner| self.entities.get(&owner))
            else {
                continue;
            };
            if !entity.contains_all(plan.indices.as_ref()) {
                continue;
            }
            let Some(items) = Q::fetch(entity, self.pools, &plan.indices) else {
                continue;
            };
            if self.predicate.as_ref().is_none_or(|predicate| predicate.test(&items)) {
                return Some((entity.id(), items));
            }
        }
        None
    }
}

impl<'w, Q: ComponentTuple> Iterator for JoinIter<'w, Q> {
    type Item = Q::Refs<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(|(_, items)| items)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.as_ref().map_or(0, |plan| {
            self.pools.len_of(plan.driver).saturating_sub(self.cursor)
        });
        (0, Some(remaining))
    }
}

/// [`JoinIter`] yielding `(owner, tuple)` pairs.
pub struct JoinOwners<'w, Q: ComponentTuple>(JoinIter<'w, Q>);

impl<'w, Q: ComponentTuple> Iterator for JoinOwners<'w, Q> {
    type Item = (EntityId, Q::Refs<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_entry()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl World {
    /// Every live `T`, in pool storage order.
    #[must_use]
    pub fn query<T: Component>(&self) -> ComponentIter<'_, T> {
        ComponentIter::new(self, None)
    }

    /// Every live `T` satisfying `predicate`, in pool storage order.
    #[must_use]
    pub fn query_filtered<'w, T, F>(&'w self, predicate: F) -> ComponentIter<'w, T>
    where
        T: Component,
        F: Fn(&T) -> bool + 'w,
    {
        ComponentIter::new(self, Some(Box::new(predicate)))
    }

    /// Mutable access to every live `T`, in pool storage order.
    pub fn query_mut<T: Component>(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        let index = self.registry.lookup::<T>();
        index
            .and_then(|index| self.pools.pool_mut::<T>(index))
            .into_iter()
            .flat_map(|pool| pool.iter_mut())
    }

    /// Every entity carrying all members of `Q`, as a tuple of references in
    /// declaration order.
    ///
    /// ```rust
    /// # use compo_admin::{Component, World};
    /// # #[derive(Default)] struct Movement(f32);
    /// # impl Component for Movement {
    /// #     type Args = f32;
    /// #     fn reset(&mut self, velocity: f32) { self.0 = velocity; }
    /// # }
    /// # #[derive(Default)] struct Health(f32);
    /// # impl Component for Health {
    /// #     type Args = f32;
    /// #     fn reset(&mut self, hp: f32) { self.0 = hp; }
    /// # }
    /// # fn main() -> Result<(), compo_admin::EcsError> {
    /// let mut world = World::new();
    /// world.create_entity().add::<Movement>(10.0)?.add::<Health>(50.0)?;
    /// world.create_entity().add::<Movement>(40.0)?;
    ///
    /// let pairs: Vec<_> = world.join::<(Movement, Health)>().collect();
    /// assert_eq!(pairs.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn join<Q: ComponentTuple>(&self) -> JoinIter<'_, Q> {
        JoinIter::new(self, None)
    }

    /// Like [`World::join`], keeping only tuples accepted by `predicate`.
    ///
    /// The predicate takes one reference per member, so closures need their
    /// parameter types spelled out:
    /// `world.join_filtered::<(A, B), _>(|a: &A, b: &B| ..)`.
    #[must_use]
    pub fn join_filtered<'w, Q, P>(&'w self, predicate: P) -> JoinIter<'w, Q>
    where
        Q: ComponentTuple,
        P: JoinPredicate<Q> + 'w,
    {
        JoinIter::new(self, Some(Box::new(predicate)))
    }

    /// Run `visitor` with mutable references to the members of every entity
    /// carrying all of `Q`. Returns the number of entities visited.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names the same component type twice.
    pub fn for_each_mut<Q, V>(&mut self, mut visitor: V) -> usize
    where
        Q: ComponentTuple,
        V: JoinVisitor<Q>,
    {
        self.visit_join::<Q, V>(None, &mut visitor)
    }

    /// Like [`World::for_each_mut`], visiting only tuples accepted by
    /// `predicate`.
    pub fn for_each_mut_filtered<Q, P, V>(&mut self, predicate: P, mut visitor: V) -> usize
    where
        Q: ComponentTuple,
        P: JoinPredicate<Q>,
        V: JoinVisitor<Q>,
    {
        self.visit_join::<Q, V>(Some(&predicate as &dyn JoinPredicate<Q>), &mut visitor)
    }

    fn visit_join<Q, V>(&mut self, predicate: Option<&dyn JoinPredicate<Q>>, visitor: &mut V) -> usize
    where
        Q: ComponentTuple,
        V: JoinVisitor<Q>,
    {
        let Some(JoinPlan { indices, driver }) = JoinPlan::<Q>::new(self) else {
            return 0;
        };

        let mut visited = 0;
        for position in 0..self.pools.len_of(driver) {
            let Some(entity) = self
                .pools
                .erased(driver)
                .and_then(|pool| pool.owner_at(position))
                .and_then(|owner| self.entities.get(&owner))
            else {
                continue;
            };
            if !entity.contains_all(indices.as_ref()) {
                continue;
            }
            if let Some(predicate) = predicate {
                let accepted = Q::fetch(entity, &self.pools, &indices)
                    .is_some_and(|items| predicate.test(&items));
                if !accepted {
                    continue;
                }
            }
            if let Some(items) = Q::fetch_mut(entity, &mut self.pools, &indices) {
                visitor.visit(items);
                visited += 1;
            }
        }
        trace!(members = ?Q::type_names(), %driver, visited, "visited join");
        visited
    }
}
