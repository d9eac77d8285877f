//! Ephemeral per-mission view state

use crate::mission::MissionId;
use crate::scoring::Accuracy;
use serde::{Deserialize, Serialize};

/// View state for the active mission; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionViewState {
    /// Active mission
    pub mission_id: MissionId,
    /// Satisfied or revealed in this session
    pub verified: bool,
    /// Answer was shown rather than earned
    pub revealed: bool,
    /// Raw accuracy for the current attempt run
    pub accuracy: Accuracy,
    /// An evaluation is pending
    pub in_flight: bool,
}

impl MissionViewState {
    /// Fresh view on selecting a mission
    ///
    /// A mission completed earlier opens already verified.
    #[must_use]
    pub fn fresh(mission_id: MissionId, completed: bool) -> Self {
        Self {
            mission_id,
            verified: completed,
            revealed: false,
            accuracy: Accuracy::FULL,
            in_flight: false,
        }
    }

    /// Accuracy as displayed: full once the mission is verified
    #[inline]
    #[must_use]
    pub fn displayed_accuracy(&self) -> Accuracy {
        if self.verified {
            Accuracy::FULL
        } else {
            self.accuracy
        }
    }

    /// Resolved by disclosure rather than by an accepted submission
    #[inline]
    #[must_use]
    pub fn resolved_by_disclosure(&self) -> bool {
        self.revealed
    }
}
