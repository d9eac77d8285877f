//! Error types for Dojo Core
//!
//! Provides error handling for:
//! - Mission catalog loading and validation
//! - Engine configuration loading
//! - Illegal progression transitions

use crate::mission::MissionId;
use crate::progression::MissionState;
use std::path::PathBuf;

/// Errors raised while loading or validating a mission catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog contains no missions
    #[error("mission catalog is empty")]
    Empty,

    /// Identifiers are not the dense sequence 1..=N
    #[error("mission at position {position} has id {found}, expected {expected}")]
    NonDenseId {
        /// Zero-based position in the catalog
        position: usize,
        /// Identifier the position requires
        expected: MissionId,
        /// Identifier actually authored
        found: MissionId,
    },

    /// Reward must be a positive integer
    #[error("mission {0} has a zero reward")]
    ZeroReward(MissionId),

    /// Starting snippet already equals the reference after loose folding,
    /// so every submission of the answer would be reported as unchanged
    #[error("mission {0} has a reference snippet identical to its starting snippet")]
    ReferenceEqualsStart(MissionId),

    /// TOML decode failure
    #[error("invalid catalog toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON decode failure
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error reading a catalog file
    #[error("io error reading {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File extension is neither `.toml` nor `.json`
    #[error("unsupported catalog format: '{0}'")]
    UnsupportedFormat(String),
}

impl CatalogError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while loading engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML decode failure
    #[error("invalid config toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error reading the config file
    #[error("io error reading {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A value is out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// Why the value was refused
        reason: String,
    },
}

/// Progression errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    /// Transition not permitted by the mission state machine
    #[error("illegal transition for mission {mission}: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Mission being transitioned
        mission: MissionId,
        /// Current state
        from: MissionState,
        /// Requested state
        to: MissionState,
    },
}
