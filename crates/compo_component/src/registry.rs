//! Type registry: lazily assigns stable indices to component and system types.
//!
//! The registry is owned by the world and passed by reference wherever a type
//! has to be mapped to its index. Assignment happens on first use through
//! `&mut self`. Callers that need every index fixed up front can run a
//! warm-up pass over [`TypeRegistry::index_of`] and
//! [`TypeRegistry::system_index_of`].

use std::any::TypeId;
use std::collections::HashMap;

use tracing::trace;

use crate::component::{Component, SystemIndex, TypeIndex};

/// Registry of component and system type indices.
///
/// Component types and system types are counted separately, each starting
/// at `0`.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    components: HashMap<TypeId, TypeIndex>,
    component_names: Vec<&'static str>,
    systems: HashMap<TypeId, SystemIndex>,
    system_names: Vec<&'static str>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of component type `T`, assigning the next free one
    /// on the first call for `T`.
    pub fn index_of<T: Component>(&mut self) -> TypeIndex {
        let names = &mut self.component_names;
        *self.components.entry(TypeId::of::<T>()).or_insert_with(|| {
            let index = TypeIndex(next_index(names.len()));
            names.push(T::type_name());
            trace!(component = T::type_name(), %index, "registered component type");
            index
        })
    }

    /// Returns the index of component type `T` if it has already been assigned.
    #[must_use]
    pub fn lookup<T: Component>(&self) -> Option<TypeIndex> {
        self.components.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the index of system type `S`, assigning the next free one on
    /// the first call for `S`.
    pub fn system_index_of<S: 'static>(&mut self) -> SystemIndex {
        let names = &mut self.system_names;
        *self.systems.entry(TypeId::of::<S>()).or_insert_with(|| {
            let index = SystemIndex(next_index(names.len()));
            let name = std::any::type_name::<S>();
            names.push(name);
            trace!(system = name, %index, "registered system type");
            index
        })
    }

    /// Returns the index of system type `S` if it has already been assigned.
    #[must_use]
    pub fn lookup_system<S: 'static>(&self) -> Option<SystemIndex> {
        self.systems.get(&TypeId::of::<S>()).copied()
    }

    /// Returns the name recorded for a component type index.
    #[must_use]
    pub fn component_name(&self, index: TypeIndex) -> Option<&'static str> {
        self.component_names.get(index.as_usize()).copied()
    }

    /// Returns the name recorded for a system type index.
    #[must_use]
    pub fn system_name(&self, index: SystemIndex) -> Option<&'static str> {
        self.system_names.get(index.as_usize()).copied()
    }

    /// Returns the number of component types registered so far.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.component_names.len()
    }

    /// Returns the number of system types registered so far.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.system_names.len()
    }
}

fn next_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("more than {} types registered", u32::MAX))
}
