//! Admin configuration.

use serde::{Deserialize, Serialize};

/// Errors raised while loading an [`AdminConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid JSON or does not match the expected shape.
    #[error("invalid admin configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Capacity hints applied when an [`EntityAdmin`](crate::EntityAdmin) is built.
///
/// All fields default to `0`, meaning storage grows on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Entity directory slots reserved up front.
    pub entity_capacity: usize,
    /// Slots reserved in each component pool when it is first created.
    pub pool_capacity: usize,
    /// System slots reserved up front.
    pub system_capacity: usize,
}

impl AdminConfig {
    /// Create a configuration with every capacity at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_system_capacity(mut self, capacity: usize) -> Self {
        self.system_capacity = capacity;
        self
    }

    /// Parse a configuration from a JSON document. Missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero() {
        let config = AdminConfig::default();
        assert_eq!(config.entity_capacity, 0);
        assert_eq!(config.pool_capacity, 0);
        assert_eq!(config.system_capacity, 0);
    }

    #[test]
    fn test_builder() {
        let config = AdminConfig::new()
            .with_entity_capacity(1024)
            .with_pool_capacity(256)
            .with_system_capacity(8);
        assert_eq!(config.entity_capacity, 1024);
        assert_eq!(config.pool_capacity, 256);
        assert_eq!(config.system_capacity, 8);
    }

    #[test]
    fn test_from_json_partial() {
        let config = AdminConfig::from_json(r#"{ "pool_capacity": 64 }"#).unwrap();
        assert_eq!(config, AdminConfig::new().with_pool_capacity(64));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = AdminConfig::from_json("{ pool_capacity: }").unwrap_err();
        assert!(err.to_string().starts_with("invalid admin configuration"));
    }
}
