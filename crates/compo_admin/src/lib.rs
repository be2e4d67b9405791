//! # compo_admin
//!
//! The runtime half of the composition model. An [`EntityAdmin`] owns every
//! entity, every component pool and every system, and drives the per-tick
//! update pass.
//!
//! This crate provides:
//!
//! - [`World`]: the entity directory plus component storage, with
//!   [`EntityRef`] / [`EntityMut`] handles for per-entity access.
//! - Single-type queries ([`World::query`]) and multi-type joins
//!   ([`World::join`], [`World::for_each_mut`]) that walk the smallest pool.
//! - [`System`]: the per-tick behaviour contract, and [`EntityAdmin`], which
//!   runs systems in ascending system type index order.
//! - [`AdminConfig`]: capacity hints, loadable from JSON.
//!
//! Component definitions and storage live in [`compo_component`] and are
//! re-exported here.
//!
//! Logging goes through `tracing`. The library never installs a subscriber;
//! binaries and tests choose their own.

pub mod admin;
pub mod config;
pub mod query;
pub mod system;
pub mod world;

#[cfg(test)]
mod test_components;

pub use admin::EntityAdmin;
pub use config::{AdminConfig, ConfigError};
pub use query::{
    ComponentIter, ComponentOwners, JoinIter, JoinOwners, JoinPredicate, JoinVisitor,
    select_driver,
};
pub use system::System;
pub use world::{EntityMut, EntityRef, World};

pub use compo_component::{
    Component, ComponentKey, ComponentTuple, EcsError, EntityId, SystemIndex, TypeIndex,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_components::{Health, Position, init_tracing};

    #[test]
    fn test_end_to_end_composition() {
        init_tracing();
        let mut admin = EntityAdmin::new();
        let id = admin
            .create_entity()
            .add::<Position>((1.0, 2.0, 3.0))
            .unwrap()
            .add::<Health>((50.0, 70.0))
            .unwrap()
            .id();
        assert!(admin.find_entity(id).unwrap().has_all::<(Position, Health)>());

        admin.entity_mut(id).unwrap().remove::<Position>().unwrap();
        let entity = admin.find_entity(id).unwrap();
        assert!(!entity.has::<Position>() && entity.has::<Health>());

        let healths: Vec<(EntityId, &Health)> = admin.query::<Health>().with_owner().collect();
        assert_eq!(healths, vec![(id, &Health::new(50.0, 70.0))]);
        assert_eq!(admin.query::<Position>().count(), 0);
        assert_eq!(admin.join::<(Position, Health)>().count(), 0);
    }
}
