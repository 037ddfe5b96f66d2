//! Error types for Gauntlet.
//!
//! Only configuration loading and validation produce errors. The per-tick
//! simulation API degrades and logs instead of failing.

use thiserror::Error;

/// Top-level error type for Gauntlet operations.
#[derive(Debug, Error)]
pub enum GauntletError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Config text could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Boss phase thresholds are not strictly decreasing within (0, 1)
    #[error("Invalid phase thresholds for '{archetype}': {reason}")]
    InvalidPhaseThresholds {
        /// Archetype name
        archetype: String,
        /// What is wrong with the list
        reason: String,
    },

    /// A spawner references an archetype that does not exist
    #[error("Spawner '{spawner}' references unknown archetype '{archetype}'")]
    UnknownArchetype {
        /// Spawner name
        spawner: String,
        /// Missing archetype name
        archetype: String,
    },

    /// A numeric setting is out of range
    #[error("Invalid value for {field}: {value}")]
    OutOfRange {
        /// Field path
        field: String,
        /// Offending value
        value: String,
    },

    /// Two archetypes share the same name
    #[error("Duplicate archetype '{0}'")]
    DuplicateArchetype(String),
}

impl ConfigError {
    /// Builds an [`ConfigError::OutOfRange`] from any displayable value.
    pub fn out_of_range(field: impl Into<String>, value: impl std::fmt::Display) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

/// Result type alias for Gauntlet operations.
pub type GauntletResult<T> = Result<T, GauntletError>;
