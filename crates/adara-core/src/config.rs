//! Parser configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::layout;

/// Default initial buffer size (1 MiB).
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024 * 1024;
/// Default buffer ceiling (8 MiB); larger packets take the oversize path.
pub const DEFAULT_MAX_CAPACITY: usize = 8 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("initial capacity {initial} is below the {minimum}-byte packet header")]
    CapacityTooSmall { initial: usize, minimum: usize },
    #[error("initial capacity {initial} exceeds max capacity {max}")]
    CapacityExceedsMax { initial: usize, max: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Buffer sizing for a [`crate::Parser`].
///
/// # Examples
/// ```
/// use adara_core::ParserConfig;
///
/// let config: ParserConfig = serde_json::from_str(r#"{ "max_capacity": 65536 }"#)?;
/// assert_eq!(config.initial_capacity, adara_core::config::DEFAULT_INITIAL_CAPACITY);
/// assert!(config.validate().is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    pub initial_capacity: usize,
    pub max_capacity: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity < layout::HEADER_SIZE {
            return Err(ConfigError::CapacityTooSmall {
                initial: self.initial_capacity,
                minimum: layout::HEADER_SIZE,
            });
        }
        if self.initial_capacity > self.max_capacity {
            return Err(ConfigError::CapacityExceedsMax {
                initial: self.initial_capacity,
                max: self.max_capacity,
            });
        }
        Ok(())
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DEFAULT_MAX_CAPACITY, ParserConfig};

    #[test]
    fn defaults_are_valid() {
        ParserConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_capacity_below_header() {
        let config = ParserConfig {
            initial_capacity: 8,
            max_capacity: 64,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CapacityTooSmall { initial: 8, minimum: 16 })
        ));
    }

    #[test]
    fn load_reads_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parser.json");
        std::fs::write(&path, r#"{ "initial_capacity": 4096 }"#).unwrap();
        let config = ParserConfig::load(&path).unwrap();
        assert_eq!(config.initial_capacity, 4096);
        assert_eq!(config.max_capacity, DEFAULT_MAX_CAPACITY);
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parser.json");
        std::fs::write(&path, r#"{ "capacity": 4096 }"#).unwrap();
        assert!(matches!(
            ParserConfig::load(&path),
            Err(ConfigError::Json(_))
        ));
    }
}
