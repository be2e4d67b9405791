//! Failure taxonomy of the mutating operations.
//!
//! Pure queries (`get`, `has`, lookups) never fail; absence is reported as
//! `None` / `false`. Mutations that contradict the current composition or
//! system registration fail immediately with one of these variants and are
//! never retried internally.

use crate::entity::EntityId;

/// Errors raised by component and system lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// `add` on an entity that already has a component of that type.
    #[error("{entity} already has a {component} component")]
    DuplicateComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// `remove` of a component type the entity does not have.
    #[error("{entity} has no {component} component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// `create_system` for a system type that is already registered.
    #[error("system {system} is already registered")]
    DuplicateSystem { system: &'static str },

    /// `remove_system` for a system type that is not registered.
    #[error("system {system} is not registered")]
    MissingSystem { system: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EcsError::DuplicateComponent {
            entity: EntityId::from_raw(3),
            component: "Position",
        };
        assert_eq!(err.to_string(), "entity #3 already has a Position component");

        let err = EcsError::MissingComponent {
            entity: EntityId::from_raw(3),
            component: "Health",
        };
        assert_eq!(err.to_string(), "entity #3 has no Health component");

        let err = EcsError::MissingSystem { system: "Physics" };
        assert_eq!(err.to_string(), "system Physics is not registered");
    }
}
