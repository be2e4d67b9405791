//! Core [`Component`] trait and the identifiers used to address component
//! types and instances.
//!
//! ## Type identity
//!
//! Every concrete component type is identified by a small [`TypeIndex`]
//! handed out by a [`TypeRegistry`](crate::TypeRegistry) the first time the
//! type is referenced. System types get their own, separately counted
//! [`SystemIndex`]. Both are stable for the lifetime of the registry that
//! assigned them.
//!
//! ## Instance identity
//!
//! Component instances are addressed by [`ComponentKey`], a generation-checked
//! handle into a [`ComponentPool`](crate::ComponentPool). A key never encodes
//! a storage position, so swap-removals inside a pool never invalidate the
//! keys of the surviving components, and a key whose component was destroyed
//! resolves to nothing instead of to whatever reused its slot.

use std::fmt;

/// A stable small integer identifying a concrete component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(pub u32);

impl TypeIndex {
    /// Returns the index as a `usize`, for addressing per-type tables.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeIndex({})", self.0)
    }
}

/// A stable small integer identifying a concrete system type.
///
/// Counted independently of [`TypeIndex`]: the first system type and the
/// first component type both receive index `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemIndex(pub u32);

impl SystemIndex {
    /// Returns the index as a `usize`, for addressing the system slot array.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SystemIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemIndex({})", self.0)
    }
}

slotmap::new_key_type! {
    /// Generation-checked handle to one live component instance.
    pub struct ComponentKey;
}

/// The core component trait.
///
/// A component is a plain data record owned by exactly one entity at a time.
/// Construction is split in two steps: a default instance is built first and
/// then [`Component::reset`] is applied with the caller's arguments. Keeping
/// the reinitialisation separate lets a pool hand out recycled instances
/// without a dedicated constructor per type.
///
/// # Examples
///
/// ```rust
/// use compo_component::Component;
///
/// #[derive(Debug, Default)]
/// struct Health {
///     hp: f32,
///     mana: f32,
/// }
///
/// impl Component for Health {
///     type Args = (f32, f32);
///
///     fn reset(&mut self, (hp, mana): Self::Args) {
///         self.hp = hp;
///         self.mana = mana;
///     }
/// }
/// ```
pub trait Component: Default + 'static {
    /// Positional arguments accepted by [`Component::reset`], usually a tuple.
    type Args;

    /// Reinitialise this instance from `args`.
    ///
    /// Called immediately after construction (or reuse) and before the
    /// instance becomes visible to any entity or query.
    fn reset(&mut self, args: Self::Args);

    /// A human-readable name for this component type, used in errors and logs.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}
