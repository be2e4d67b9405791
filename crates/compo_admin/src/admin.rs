//! The entity admin: a [`World`] plus the ordered set of systems that run
//! against it each tick.

use std::ops::{Deref, DerefMut};

use compo_component::EcsError;
use tracing::{debug, trace};

use crate::config::AdminConfig;
use crate::system::{ErasedSystem, System};
use crate::world::World;

/// Owner of every entity, component and system.
///
/// Dereferences to its [`World`], so entity, query and join operations are
/// called on the admin directly.
pub struct EntityAdmin {
    world: World,
    /// Indexed by system type index; `None` marks a removed or never-created system.
    systems: Vec<Option<Box<dyn ErasedSystem>>>,
    ticks: u64,
}

impl EntityAdmin {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&AdminConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &AdminConfig) -> Self {
        debug!(
            entity_capacity = config.entity_capacity,
            pool_capacity = config.pool_capacity,
            system_capacity = config.system_capacity,
            "created entity admin"
        );
        Self {
            world: World::with_config(config),
            systems: Vec::with_capacity(config.system_capacity),
            ticks: 0,
        }
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // -- Systems --

    /// Build an `S` and slot it at its system type index.
    ///
    /// Fails with [`EcsError::DuplicateSystem`] if an `S` already exists; the
    /// existing instance is kept.
    pub fn create_system<S: System>(&mut self) -> Result<&mut S, EcsError> {
        let index = self.world.registry.system_index_of::<S>();
        let slot = index.as_usize();
        let name = std::any::type_name::<S>();
        if self.systems.get(slot).is_some_and(Option::is_some) {
            return Err(EcsError::DuplicateSystem { system: name });
        }

        let system = S::create(&mut self.world);
        if slot >= self.systems.len() {
            self.systems.resize_with(slot + 1, || None);
        }
        debug!(system = name, %index, "created system");
        let stored = self.systems[slot].insert(Box::new(system));
        match stored.as_any_mut().downcast_mut::<S>() {
            Some(system) => Ok(system),
            None => unreachable!("{index} was just filled with {name}"),
        }
    }

    /// Destroy the `S` instance.
    ///
    /// Fails with [`EcsError::MissingSystem`] if there is none.
    pub fn remove_system<S: System>(&mut self) -> Result<(), EcsError> {
        let removed = self
            .world
            .registry
            .lookup_system::<S>()
            .and_then(|index| self.systems.get_mut(index.as_usize()))
            .and_then(Option::take);
        match removed {
            Some(system) => {
                debug!(system = system.name(), "removed system");
                Ok(())
            }
            None => Err(EcsError::MissingSystem {
                system: std::any::type_name::<S>(),
            }),
        }
    }

    #[must_use]
    pub fn has_system<S: System>(&self) -> bool {
        self.system::<S>().is_some()
    }

    #[must_use]
    pub fn system<S: System>(&self) -> Option<&S> {
        let index = self.world.registry.lookup_system::<S>()?;
        self.systems
            .get(index.as_usize())?
            .as_deref()?
            .as_any()
            .downcast_ref()
    }

    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        let index = self.world.registry.lookup_system::<S>()?;
        self.systems
            .get_mut(index.as_usize())?
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut()
    }

    /// Number of live systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.iter().flatten().count()
    }

    /// Number of completed [`EntityAdmin::update`] calls.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run every live system once, in ascending system type index order.
    pub fn update(&mut self, dt: f64) {
        let mut ran = 0usize;
        for system in self.systems.iter_mut().flatten() {
            system.run(&mut self.world, dt);
            ran += 1;
        }
        self.ticks += 1;
        trace!(tick = self.ticks, dt, systems = ran, "updated systems");
    }
}

impl Default for EntityAdmin {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for EntityAdmin {
    type Target = World;

    fn deref(&self) -> &World {
        &self.world
    }
}

impl DerefMut for EntityAdmin {
    fn deref_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl std::fmt::Debug for EntityAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let systems: Vec<&str> = self.systems.iter().flatten().map(|system| system.name()).collect();
        f.debug_struct("EntityAdmin")
            .field("world", &self.world)
            .field("systems", &systems)
            .field("ticks", &self.ticks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use compo_component::EntityId;

    use super::*;
    use crate::test_components::{Health, Movement, Position, Tracked, init_tracing};

    /// Moves every `Position` along x by its `Movement` velocity.
    #[derive(Debug)]
    struct PhysicsSystem {
        steps: u32,
    }

    impl System for PhysicsSystem {
        fn create(_world: &mut World) -> Self {
            Self { steps: 0 }
        }

        fn update(&mut self, world: &mut World, dt: f64) {
            self.steps += 1;
            let dt = dt as f32;
            world.for_each_mut::<(Position, Movement), _>(|p: &mut Position, m: &mut Movement| {
                p.x += m.velocity * dt;
            });
        }
    }

    /// Spawns one entity at creation and drains health every tick.
    #[derive(Debug)]
    struct DecaySystem {
        spawned: EntityId,
    }

    impl System for DecaySystem {
        fn create(world: &mut World) -> Self {
            let spawned = world.create_entity().replace::<Health>((10.0, 0.0)).id();
            Self { spawned }
        }

        fn update(&mut self, world: &mut World, _dt: f64) {
            for health in world.query_mut::<Health>() {
                health.hp -= 1.0;
            }
        }
    }

    thread_local! {
        static RUN_ORDER: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    macro_rules! order_system {
        ($name:ident) => {
            #[derive(Debug)]
            struct $name;

            impl System for $name {
                fn create(_world: &mut World) -> Self {
                    $name
                }

                fn update(&mut self, _world: &mut World, _dt: f64) {
                    RUN_ORDER.with(|order| order.borrow_mut().push(stringify!($name)));
                }
            }
        };
    }

    order_system!(FirstSystem);
    order_system!(SecondSystem);
    order_system!(ThirdSystem);

    #[test]
    fn test_create_system_once() {
        let mut admin = EntityAdmin::new();
        admin.create_system::<PhysicsSystem>().unwrap();
        assert!(admin.has_system::<PhysicsSystem>());
        assert_eq!(admin.system_count(), 1);

        let err = admin.create_system::<PhysicsSystem>().unwrap_err();
        assert!(matches!(err, EcsError::DuplicateSystem { .. }));
        assert_eq!(admin.system_count(), 1);
    }

    #[test]
    fn test_create_system_returns_stored_instance() {
        let mut admin = EntityAdmin::new();
        admin.create_system::<PhysicsSystem>().unwrap().steps = 5;
        assert_eq!(admin.system::<PhysicsSystem>().map(|s| s.steps), Some(5));

        let err = admin.create_system::<PhysicsSystem>().unwrap_err();
        assert!(matches!(err, EcsError::DuplicateSystem { .. }));
        assert_eq!(admin.system::<PhysicsSystem>().map(|s| s.steps), Some(5));
    }

    #[test]
    fn test_system_lifecycle() {
        let mut admin = EntityAdmin::new();
        admin.create_system::<PhysicsSystem>().unwrap();
        admin.remove_system::<PhysicsSystem>().unwrap();
        assert!(!admin.has_system::<PhysicsSystem>());
        assert_eq!(admin.system_count(), 0);

        let err = admin.remove_system::<PhysicsSystem>().unwrap_err();
        assert!(matches!(err, EcsError::MissingSystem { .. }));
        let err = admin.remove_system::<DecaySystem>().unwrap_err();
        assert!(matches!(err, EcsError::MissingSystem { .. }));

        admin.create_system::<PhysicsSystem>().unwrap();
        assert!(admin.has_system::<PhysicsSystem>());
    }

    #[test]
    fn test_update_runs_systems() {
        init_tracing();
        let mut admin = EntityAdmin::new();
        let id = admin
            .create_entity()
            .add::<Position>((0.0, 0.0, 0.0))
            .unwrap()
            .add::<Movement>(2.0)
            .unwrap()
            .id();
        admin.create_entity().add::<Position>((5.0, 0.0, 0.0)).unwrap();
        admin.create_system::<PhysicsSystem>().unwrap();

        admin.update(0.5);
        admin.update(0.5);

        assert_eq!(admin.ticks(), 2);
        assert_eq!(admin.system::<PhysicsSystem>().map(|s| s.steps), Some(2));
        let entity = admin.find_entity(id).unwrap();
        assert_eq!(entity.get::<Position>().unwrap().x, 2.0);
        assert_eq!(admin.query_filtered::<Position, _>(|p| p.x == 5.0).count(), 1);
    }

    #[test]
    fn test_system_creation_sees_world() {
        let mut admin = EntityAdmin::new();
        let spawned = admin.create_system::<DecaySystem>().unwrap().spawned;
        assert!(admin.contains_entity(spawned));

        admin.update(1.0);
        admin.update(1.0);
        let health = admin.find_entity(spawned).unwrap().get::<Health>().copied();
        assert_eq!(health, Some(Health::new(8.0, 0.0)));
    }

    #[test]
    fn test_system_mut() {
        let mut admin = EntityAdmin::new();
        assert!(admin.system_mut::<PhysicsSystem>().is_none());
        admin.create_system::<PhysicsSystem>().unwrap();
        admin.system_mut::<PhysicsSystem>().unwrap().steps = 41;
        admin.update(0.0);
        assert_eq!(admin.system::<PhysicsSystem>().unwrap().steps, 42);
    }

    #[test]
    fn test_update_follows_system_index_order() {
        let mut admin = EntityAdmin::new();
        admin.create_system::<SecondSystem>().unwrap();
        admin.create_system::<FirstSystem>().unwrap();
        admin.create_system::<ThirdSystem>().unwrap();
        // A re-created system keeps the slot of its first creation.
        admin.remove_system::<FirstSystem>().unwrap();
        admin.create_system::<FirstSystem>().unwrap();

        RUN_ORDER.with(|order| order.borrow_mut().clear());
        admin.update(0.016);
        let order = RUN_ORDER.with(|order| order.borrow().clone());
        assert_eq!(order, vec!["SecondSystem", "FirstSystem", "ThirdSystem"]);
    }

    #[test]
    fn test_destroy_entity_through_admin() {
        let mut admin = EntityAdmin::new();
        let live = Tracked::counter();
        let id = admin
            .create_entity()
            .add::<Tracked>(live.clone())
            .unwrap()
            .add::<Health>((1.0, 1.0))
            .unwrap()
            .id();
        assert_eq!(live.get(), 1);
        assert!(admin.destroy_entity(id));
        assert_eq!(live.get(), 0);
        assert_eq!(admin.count::<Health>(), 0);
    }

    #[test]
    fn test_dropping_admin_releases_components() {
        let live = Tracked::counter();
        {
            let mut admin = EntityAdmin::new();
            for _ in 0..3 {
                admin.create_entity().add::<Tracked>(live.clone()).unwrap();
            }
            assert_eq!(live.get(), 3);
        }
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_with_config() {
        let config = AdminConfig::from_json(r#"{ "entity_capacity": 16, "system_capacity": 4 }"#).unwrap();
        let mut admin = EntityAdmin::with_config(&config);
        admin.create_system::<PhysicsSystem>().unwrap();
        for _ in 0..3 {
            admin.update(0.1);
        }
        assert_eq!(admin.ticks(), 3);
        assert_eq!(admin.world().entity_count(), 0);
        assert!(format!("{admin:?}").contains("PhysicsSystem"));
    }
}
