//! Component types shared by the unit tests of this crate.

use std::cell::Cell;
use std::rc::Rc;

use compo_component::Component;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Component for Position {
    type Args = (f32, f32, f32);

    fn reset(&mut self, (x, y, z): Self::Args) {
        *self = Self::new(x, y, z);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Health {
    pub hp: f32,
    pub mana: f32,
}

impl Health {
    pub fn new(hp: f32, mana: f32) -> Self {
        Self { hp, mana }
    }
}

impl Component for Health {
    type Args = (f32, f32);

    fn reset(&mut self, (hp, mana): Self::Args) {
        *self = Self::new(hp, mana);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Movement {
    pub velocity: f32,
}

impl Component for Movement {
    type Args = f32;

    fn reset(&mut self, velocity: f32) {
        self.velocity = velocity;
    }
}

/// Keeps a shared count of its live instances.
#[derive(Debug, Default)]
pub struct Tracked {
    live: Option<Rc<Cell<i32>>>,
}

impl Tracked {
    pub fn counter() -> Rc<Cell<i32>> {
        Rc::new(Cell::new(0))
    }
}

impl Component for Tracked {
    type Args = Rc<Cell<i32>>;

    fn reset(&mut self, live: Self::Args) {
        live.set(live.get() + 1);
        self.live = Some(live);
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        if let Some(live) = &self.live {
            live.set(live.get() - 1);
        }
    }
}

/// Route `tracing` output through the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
