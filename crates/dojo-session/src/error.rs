//! Error types for Dojo Session
//!
//! Provides error handling for:
//! - Persistence failures
//! - Rejected session actions (locked missions, overlapping evaluations)

use dojo_core::{MissionId, ProgressError};
use std::path::PathBuf;

/// Progress store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Progress could not be encoded
    #[error("failed to encode progress: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Session action errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The active mission is missing from the catalog
    #[error("no active mission")]
    NoActiveMission,

    /// Mission id not in the catalog
    #[error("unknown mission: {0}")]
    UnknownMission(MissionId),

    /// Mission is above the furthest-reached watermark
    #[error("mission {0} is locked")]
    MissionLocked(MissionId),

    /// An evaluation is already pending
    #[error("an evaluation is already in flight")]
    EvaluationInFlight,

    /// Advancing requires the current mission to be verified or revealed
    #[error("mission {0} has not been resolved")]
    NotResolved(MissionId),

    /// A pending evaluation was cancelled by reset or mission change
    #[error("evaluation superseded")]
    Superseded,

    /// Illegal progression transition
    #[error("progress error: {0}")]
    Progress(#[from] ProgressError),

    /// Persistence failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether retrying the same action later may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EvaluationInFlight | Self::Superseded | Self::Store(StoreError::Io { .. })
        )
    }
}
