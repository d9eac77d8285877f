//! Progression tracking
//!
//! Per-mission state machine plus the persisted progress record.
//!
//! ```text
//! Locked ──unlock──▶ Unlocked ──complete──▶ Completed
//!    ▲                   │                      │
//!    └──────reset────────┴──────────────────────┘
//! ```
//!
//! Lock state is derived, never stored: a mission is locked iff its id is
//! above the `furthest_reached` watermark, which only moves forward until an
//! explicit reset.

use crate::error::ProgressError;
use crate::mission::MissionId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Derived per-mission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionState {
    /// Not yet selectable
    Locked,
    /// Selectable, not completed
    Unlocked,
    /// Completed by an unassisted accepted submission
    Completed,
}

/// Validate a mission state transition
///
/// # Errors
/// Returns [`ProgressError::IllegalTransition`] when `from -> to` is not allowed.
pub fn validate_transition(
    mission: MissionId,
    from: MissionState,
    to: MissionState,
) -> Result<(), ProgressError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ProgressError::IllegalTransition { mission, from, to })
    }
}

/// Transitions permitted out of `from`
#[must_use]
pub fn allowed_transitions(from: MissionState) -> Vec<MissionState> {
    use MissionState::{Completed, Locked, Unlocked};
    match from {
        Locked => vec![Unlocked],
        Unlocked => vec![Completed, Locked],
        Completed => vec![Locked],
    }
}

/// Persisted learner progress
///
/// Saved as one record so completion, score and watermark never diverge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Completed missions in completion order
    pub completed: IndexSet<MissionId>,
    /// Cumulative score
    pub score: u64,
    /// Highest selectable mission
    pub furthest_reached: MissionId,
    /// Whether the onboarding tutorial has been dismissed
    pub onboarding_seen: bool,
}

impl ProgressState {
    /// Initial progress: nothing completed, mission 1 reachable
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived state of a mission
    #[must_use]
    pub fn state_of(&self, id: MissionId) -> MissionState {
        if self.completed.contains(&id) {
            MissionState::Completed
        } else if id > self.furthest_reached {
            MissionState::Locked
        } else {
            MissionState::Unlocked
        }
    }

    /// Whether the mission is above the watermark
    #[inline]
    #[must_use]
    pub fn is_locked(&self, id: MissionId) -> bool {
        id > self.furthest_reached
    }

    /// Whether the mission has been completed
    #[inline]
    #[must_use]
    pub fn is_completed(&self, id: MissionId) -> bool {
        self.completed.contains(&id)
    }

    /// Recompute the watermark from the completed set and current selection
    ///
    /// Returns true if the watermark moved.
    pub fn ratchet(&mut self, current: MissionId) -> bool {
        let candidate = self
            .completed
            .iter()
            .copied()
            .chain(std::iter::once(current))
            .max()
            .unwrap_or(current);
        self.raise_watermark(candidate)
    }

    /// Unlock the mission after `resolved`, capped at `last`
    ///
    /// Returns true if the watermark moved.
    pub fn unlock_after(&mut self, resolved: MissionId, last: MissionId) -> bool {
        self.raise_watermark(resolved.next().min(last))
    }

    fn raise_watermark(&mut self, candidate: MissionId) -> bool {
        if candidate > self.furthest_reached {
            tracing::debug!(from = %self.furthest_reached, to = %candidate, "watermark advanced");
            self.furthest_reached = candidate;
            true
        } else {
            false
        }
    }

    /// Move a mission to `Completed`
    ///
    /// Returns false (and changes nothing) if it was already completed.
    ///
    /// # Errors
    /// Returns [`ProgressError::IllegalTransition`] for a locked mission.
    pub fn mark_completed(&mut self, id: MissionId) -> Result<bool, ProgressError> {
        let from = self.state_of(id);
        if from == MissionState::Completed {
            return Ok(false);
        }
        validate_transition(id, from, MissionState::Completed)?;
        self.completed.insert(id);
        Ok(true)
    }

    /// Restrict to ids in `1..=last` and restore the watermark those imply
    ///
    /// Used after loading persisted data written against another catalog.
    pub fn reconcile(&mut self, last: MissionId) {
        let before = self.completed.len();
        self.completed.retain(|id| *id >= MissionId::FIRST && *id <= last);
        if self.completed.len() != before {
            tracing::warn!(
                dropped = before - self.completed.len(),
                "discarded completed ids outside the catalog"
            );
        }
        self.furthest_reached = self.furthest_reached.clamp(MissionId::FIRST, last);
        let resolved: Vec<MissionId> = self.completed.iter().copied().collect();
        for id in resolved {
            self.unlock_after(id, last);
        }
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            completed: IndexSet::new(),
            score: 0,
            furthest_reached: MissionId::FIRST,
            onboarding_seen: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn initial_state_unlocks_only_first() {
        let progress = ProgressState::new();
        assert_eq!(progress.state_of(MissionId(1)), MissionState::Unlocked);
        assert_eq!(progress.state_of(MissionId(2)), MissionState::Locked);
        assert_eq!(progress.furthest_reached, MissionId(1));
    }

    #[test]
    fn transition_table() {
        let id = MissionId(1);
        assert!(validate_transition(id, MissionState::Unlocked, MissionState::Completed).is_ok());
        assert!(validate_transition(id, MissionState::Locked, MissionState::Unlocked).is_ok());
        assert!(validate_transition(id, MissionState::Completed, MissionState::Locked).is_ok());
        assert!(validate_transition(id, MissionState::Locked, MissionState::Completed).is_err());
        assert!(validate_transition(id, MissionState::Completed, MissionState::Unlocked).is_err());
    }

    #[test]
    fn locked_mission_cannot_complete() {
        let mut progress = ProgressState::new();
        let err = progress.mark_completed(MissionId(3)).unwrap_err();
        assert_eq!(
            err,
            ProgressError::IllegalTransition {
                mission: MissionId(3),
                from: MissionState::Locked,
                to: MissionState::Completed,
            }
        );
        assert!(progress.completed.is_empty());
    }

    #[test]
    fn completion_is_idempotent() {
        let mut progress = ProgressState::new();
        assert!(progress.mark_completed(MissionId(1)).unwrap());
        assert!(!progress.mark_completed(MissionId(1)).unwrap());
        assert_eq!(progress.completed.len(), 1);
    }

    #[test]
    fn watermark_never_moves_back() {
        let mut progress = ProgressState::new();
        assert!(progress.unlock_after(MissionId(1), MissionId(5)));
        assert!(progress.unlock_after(MissionId(2), MissionId(5)));
        assert!(!progress.ratchet(MissionId(1)));
        assert_eq!(progress.furthest_reached, MissionId(3));
        assert_eq!(progress.state_of(MissionId(3)), MissionState::Unlocked);
    }

    #[test]
    fn unlock_after_is_capped_at_last() {
        let mut progress = ProgressState::new();
        progress.furthest_reached = MissionId(5);
        assert!(!progress.unlock_after(MissionId(5), MissionId(5)));
        assert_eq!(progress.furthest_reached, MissionId(5));
    }

    #[test]
    fn reconcile_drops_unknown_and_restores_watermark() {
        let mut progress = ProgressState::new();
        progress.completed.extend([MissionId(2), MissionId(9), MissionId(0)]);
        progress.furthest_reached = MissionId(40);
        progress.reconcile(MissionId(5));
        assert_eq!(progress.completed.iter().copied().collect::<Vec<_>>(), vec![MissionId(2)]);
        assert_eq!(progress.furthest_reached, MissionId(5));

        let mut stale = ProgressState::new();
        stale.completed.insert(MissionId(3));
        stale.reconcile(MissionId(5));
        assert_eq!(stale.furthest_reached, MissionId(4));
    }

    #[test]
    fn completed_order_is_preserved() {
        let mut progress = ProgressState::new();
        progress.furthest_reached = MissionId(3);
        progress.mark_completed(MissionId(3)).unwrap();
        progress.mark_completed(MissionId(1)).unwrap();
        let order: Vec<_> = progress.completed.iter().copied().collect();
        assert_eq!(order, vec![MissionId(3), MissionId(1)]);
    }
}
