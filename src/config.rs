//! Tree configuration.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What happens when a view publishes or binds under a namespace that a different view instance
/// already holds under the same root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail the publish or bind with [`BindError::NamespaceCollision`](crate::BindError).
    Error,
    /// Log a warning and let the newer view take over the namespace.
    Warn,
    /// Let the newer view take over the namespace silently.
    LastWriteWins,
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        CollisionPolicy::Error
    }
}

/// Configuration shared by every view under one root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Namespace collision handling.
    pub collision: CollisionPolicy,
    /// If true, views publish their initial model as soon as they are created.
    pub publish_on_create: bool,
    /// If true, destroying a view publishes its cleared model so the host slot is reset.
    pub publish_on_destroy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            collision: CollisionPolicy::default(),
            publish_on_create: true,
            publish_on_destroy: true,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Parses a configuration from TOML. Missing fields take their default values; unknown fields
    /// are rejected.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::ParseError { source })
    }

    /// Loads a configuration file.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - Otherwise the file is parsed as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.collision, CollisionPolicy::Error);
        assert!(config.publish_on_create);
        assert!(config.publish_on_destroy);
    }

    #[test]
    fn parse_partial_toml() {
        let config = Config::from_toml_str("collision = \"last_write_wins\"\n").unwrap();
        assert_eq!(config.collision, CollisionPolicy::LastWriteWins);
        assert!(config.publish_on_create, "missing fields should keep defaults");

        let config = Config::from_toml_str("publish_on_destroy = false").unwrap();
        assert_eq!(config.collision, CollisionPolicy::Error);
        assert!(!config.publish_on_destroy);
    }

    #[test]
    fn parse_rejects_unknown_policy() {
        let err = Config::from_toml_str("collision = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let err = Config::from_toml_str("publish_on_craete = false").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn load_missing_file_is_default() {
        let config = Config::load("/nonexistent/nsview/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }
}
