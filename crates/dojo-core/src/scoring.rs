//! Scoring ledger
//!
//! Cumulative points live in [`ProgressState`] and are persisted; accuracy is
//! transient view state that resets whenever the active mission changes.

use crate::config::EngineConfig;
use crate::error::ProgressError;
use crate::mission::Mission;
use crate::progression::ProgressState;
use serde::{Deserialize, Serialize};

/// Accuracy percentage, always within `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Accuracy(u8);

impl Accuracy {
    /// Full accuracy
    pub const FULL: Self = Self(100);

    /// Clamp a raw value into range
    #[inline]
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Percentage value
    #[inline]
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Reduce by `penalty`, floored at zero
    #[inline]
    #[must_use]
    pub fn penalize(self, penalty: u8) -> Self {
        Self(self.0.saturating_sub(penalty))
    }
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::FULL
    }
}

impl std::fmt::Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Applies rewards and penalties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreLedger {
    failure_penalty: u8,
    default_reward: u32,
}

impl ScoreLedger {
    /// Create ledger from engine configuration
    #[inline]
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            failure_penalty: config.failure_penalty,
            default_reward: config.default_reward,
        }
    }

    /// Points for accepting `mission`, zero when already completed
    #[inline]
    #[must_use]
    pub fn reward_for(&self, mission: &Mission, already_completed: bool) -> u32 {
        if already_completed {
            0
        } else {
            mission.reward(self.default_reward)
        }
    }

    /// Record an unassisted acceptance
    ///
    /// Awards the reward at most once per mission and adds the mission to the
    /// completed set. Returns the score delta.
    ///
    /// # Errors
    /// Returns [`ProgressError`] if the mission is still locked.
    pub fn on_accepted(
        &self,
        progress: &mut ProgressState,
        mission: &Mission,
    ) -> Result<u32, ProgressError> {
        let already_completed = progress.is_completed(mission.id);
        let delta = self.reward_for(mission, already_completed);
        if progress.mark_completed(mission.id)? {
            progress.score = progress.score.saturating_add(u64::from(delta));
            tracing::info!(mission = %mission.id, delta, total = progress.score, "mission completed");
        }
        Ok(delta)
    }

    /// Apply the failure penalty
    #[inline]
    #[must_use]
    pub fn on_failure(&self, accuracy: Accuracy) -> Accuracy {
        accuracy.penalize(self.failure_penalty)
    }
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

/// Course rank derived from the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Below 500
    C,
    /// 500 and above
    B,
    /// 1000 and above
    A,
    /// 2000 and above
    S,
}

impl Rank {
    /// Rank for a score
    #[must_use]
    pub fn from_score(score: u64) -> Self {
        if score >= 2000 {
            Self::S
        } else if score >= 1000 {
            Self::A
        } else if score >= 500 {
            Self::B
        } else {
            Self::C
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        };
        f.write_str(s)
    }
}

/// End-of-course summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Cumulative score
    pub points: u64,
    /// Rank for that score
    pub rank: Rank,
    /// Number of missions completed unassisted
    pub completed_count: usize,
    /// Missions in the catalog
    pub total_missions: usize,
}

impl Certificate {
    /// Summarize progress against a catalog of `total_missions`
    #[must_use]
    pub fn issue(progress: &ProgressState, total_missions: usize) -> Self {
        Self {
            points: progress.score,
            rank: Rank::from_score(progress.score),
            completed_count: progress.completed.len(),
            total_missions,
        }
    }
}
