//! # compo_component
//!
//! The "C" in the composition model. It defines what a component is, how each
//! concrete type is identified, where live instances are stored, and how an
//! entity records the components attached to it.
//!
//! This crate provides:
//!
//! - [`Component`] trait: the contract every attachable data record satisfies.
//! - [`TypeRegistry`]: lazily assigned, stable [`TypeIndex`] / [`SystemIndex`] values.
//! - [`ComponentPool`]: dense per-type storage addressed by generation-checked
//!   [`ComponentKey`] handles, with swap-and-pop removal.
//! - [`ComponentPools`]: the type-erased set of pools shared by all entities.
//! - [`Entity`]: the sparse composition map from type index to component handle.
//! - [`ComponentTuple`]: fixed-arity access to several component types at once.
//! - [`EcsError`]: the failure taxonomy of the mutating operations.

pub mod component;
pub mod entity;
pub mod error;
pub mod pool;
pub mod registry;
pub mod tuple;

pub use component::{Component, ComponentKey, SystemIndex, TypeIndex};
pub use entity::{Entity, EntityAllocator, EntityId};
pub use error::EcsError;
pub use pool::{ComponentPool, ComponentPools, ErasedPool};
pub use registry::TypeRegistry;
pub use tuple::ComponentTuple;
