//! Per-tick behaviour units.

use std::any::Any;

use crate::world::World;

/// A unit of per-tick behaviour owned by an [`EntityAdmin`](crate::EntityAdmin).
///
/// At most one instance of each system type lives in an admin. Systems reach
/// entities and components through the `world` they are handed; they never
/// hold onto it between calls.
pub trait System: 'static {
    /// Build the system. Runs once, when the admin creates it.
    fn create(world: &mut World) -> Self
    where
        Self: Sized;

    /// Advance by `dt` seconds.
    fn update(&mut self, world: &mut World, dt: f64);

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub(crate) trait ErasedSystem {
    fn run(&mut self, world: &mut World, dt: f64);
    fn name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> ErasedSystem for S {
    fn run(&mut self, world: &mut World, dt: f64) {
        self.update(world, dt);
    }

    fn name(&self) -> &'static str {
        System::name(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
