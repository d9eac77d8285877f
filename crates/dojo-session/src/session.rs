//! Session orchestration
//!
//! A [`Session`] owns the loaded catalog, the learner's progress and the view
//! state of the active mission. Every action that changes progress performs
//! exactly one [`ProgressStore::save`] of the whole record; in-memory progress
//! only changes once that save has succeeded.
//!
//! Evaluation is split in two halves ([`Session::begin_evaluation`] and
//! [`Session::complete_evaluation`]) so a caller can pace the verdict without
//! holding the session. A ticket from before a reset or a mission change is
//! rejected as [`SessionError::Superseded`].

use crate::error::{SessionError, StoreError};
use crate::store::ProgressStore;
use dojo_core::{
    Accuracy, Catalog, Certificate, EngineConfig, Evaluator, Mission, MissionId, MissionState,
    MissionViewState, ProgressState, ScoreLedger, SubmissionResult,
};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Claim on the single evaluation slot of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationTicket {
    mission_id: MissionId,
    epoch: u64,
}

impl EvaluationTicket {
    /// Mission being evaluated
    #[inline]
    #[must_use]
    pub fn mission_id(&self) -> MissionId {
        self.mission_id
    }
}

/// Everything the presentation layer needs after one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationSnapshot {
    /// Verdict and rule breakdown
    pub result: SubmissionResult,
    /// Points awarded by this submission
    pub score_delta: u32,
    /// Displayed accuracy after the submission
    pub accuracy: Accuracy,
    /// Accepted after the answer was revealed; neither completes nor scores
    pub assisted: bool,
    /// Progress after the submission
    pub progress: ProgressState,
}

/// Reference answer shown by [`Session::reveal`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disclosure {
    /// Mission revealed
    pub mission_id: MissionId,
    /// Reference answer
    pub reference_snippet: String,
    /// Explanation of the fix
    pub explanation: String,
    /// Whether revealing unlocked the following mission
    pub unlocked_next: bool,
}

/// Result of [`Session::next_mission`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextStep {
    /// The following mission is now active
    Mission {
        /// Newly selected mission
        id: MissionId,
    },
    /// The last mission was resolved
    CourseComplete {
        /// End-of-course summary
        certificate: Certificate,
    },
}

/// Read-only view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Active mission view
    pub view: MissionViewState,
    /// Displayed accuracy
    pub accuracy: Accuracy,
    /// Persisted progress
    pub progress: ProgressState,
    /// Missions in the catalog
    pub total_missions: usize,
}

/// Mission verification and progression session
#[derive(Debug)]
pub struct Session<S> {
    catalog: Arc<Catalog>,
    store: S,
    config: EngineConfig,
    evaluator: Evaluator,
    ledger: ScoreLedger,
    progress: ProgressState,
    view: MissionViewState,
    epoch: u64,
}

impl<S: ProgressStore> Session<S> {
    /// Open a session, loading progress from `store`
    ///
    /// Progress written against another catalog is reconciled: unknown ids are
    /// dropped and the watermark is clamped. The first unlocked incomplete
    /// mission becomes active.
    pub fn open(catalog: impl Into<Arc<Catalog>>, store: S, config: EngineConfig) -> Self {
        let catalog = catalog.into();
        let mut progress = store.load();
        progress.reconcile(catalog.last_id());

        let active = catalog
            .iter()
            .map(|m| m.id)
            .find(|id| progress.state_of(*id) == MissionState::Unlocked)
            .unwrap_or(progress.furthest_reached);
        let view = MissionViewState::fresh(active, progress.is_completed(active));

        tracing::info!(
            missions = catalog.len(),
            completed = progress.completed.len(),
            score = progress.score,
            active = %active,
            "session opened"
        );

        Self {
            evaluator: Evaluator::new(&config),
            ledger: ScoreLedger::new(&config),
            catalog,
            store,
            config,
            progress,
            view,
            epoch: 0,
        }
    }

    /// Loaded catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Persisted progress
    #[inline]
    #[must_use]
    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Active mission view
    #[inline]
    #[must_use]
    pub fn view(&self) -> &MissionViewState {
        &self.view
    }

    /// Injected store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active mission
    ///
    /// # Errors
    /// Returns [`SessionError::NoActiveMission`] if the catalog lacks it.
    pub fn current_mission(&self) -> Result<&Mission, SessionError> {
        self.catalog
            .get(self.view.mission_id)
            .ok_or(SessionError::NoActiveMission)
    }

    /// Derived state of every mission, in catalog order
    #[must_use]
    pub fn mission_states(&self) -> Vec<(MissionId, MissionState)> {
        self.catalog
            .iter()
            .map(|m| (m.id, self.progress.state_of(m.id)))
            .collect()
    }

    /// Current view and progress
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            view: self.view,
            accuracy: self.view.displayed_accuracy(),
            progress: self.progress.clone(),
            total_missions: self.catalog.len(),
        }
    }

    /// Claim the evaluation slot for the active mission
    ///
    /// # Errors
    /// - [`SessionError::EvaluationInFlight`] if another evaluation is pending
    /// - [`SessionError::NoActiveMission`] if the active mission is unknown
    pub fn begin_evaluation(&mut self) -> Result<EvaluationTicket, SessionError> {
        if self.view.in_flight {
            return Err(SessionError::EvaluationInFlight);
        }
        self.current_mission()?;
        self.view.in_flight = true;
        Ok(EvaluationTicket {
            mission_id: self.view.mission_id,
            epoch: self.epoch,
        })
    }

    /// Release a claimed slot without evaluating
    ///
    /// Stale tickets are ignored.
    pub fn abandon_evaluation(&mut self, ticket: EvaluationTicket) {
        if self.is_ticket_current(ticket) {
            self.view.in_flight = false;
        }
    }

    /// Evaluate `submitted` under a previously claimed ticket
    ///
    /// # Errors
    /// - [`SessionError::Superseded`] if a reset or mission change happened
    ///   since the ticket was issued; nothing changes
    /// - [`SessionError::Store`] if the resulting progress could not be saved
    pub fn complete_evaluation(
        &mut self,
        ticket: EvaluationTicket,
        submitted: &str,
    ) -> Result<EvaluationSnapshot, SessionError> {
        let evaluator = self.evaluator.clone();
        self.complete_with(ticket, |mission| evaluator.evaluate(submitted, mission))
    }

    // Verdict-independent half of `complete_evaluation`; `evaluate` runs with
    // panics contained.
    fn complete_with(
        &mut self,
        ticket: EvaluationTicket,
        evaluate: impl FnOnce(&Mission) -> SubmissionResult,
    ) -> Result<EvaluationSnapshot, SessionError> {
        if !self.is_ticket_current(ticket) {
            return Err(SessionError::Superseded);
        }
        self.view.in_flight = false;

        let catalog = Arc::clone(&self.catalog);
        let mission = catalog
            .get(ticket.mission_id)
            .ok_or(SessionError::NoActiveMission)?;
        let result = contain_panic(mission.id, || evaluate(mission));

        let mut score_delta = 0;
        let mut assisted = false;
        if result.outcome.is_accepted() {
            if self.view.revealed {
                assisted = true;
                tracing::debug!(mission = %mission.id, "assisted submission accepted");
            } else {
                let mut next = self.progress.clone();
                score_delta = self.ledger.on_accepted(&mut next, mission)?;
                next.unlock_after(mission.id, catalog.last_id());
                self.commit(next)?;
            }
            self.view.verified = true;
        } else {
            self.view.accuracy = self.ledger.on_failure(self.view.accuracy);
        }

        Ok(EvaluationSnapshot {
            result,
            score_delta,
            accuracy: self.view.displayed_accuracy(),
            assisted,
            progress: self.progress.clone(),
        })
    }

    /// Evaluate `submitted` against the active mission immediately
    ///
    /// # Errors
    /// See [`Session::begin_evaluation`] and [`Session::complete_evaluation`].
    pub fn submit(&mut self, submitted: &str) -> Result<EvaluationSnapshot, SessionError> {
        let ticket = self.begin_evaluation()?;
        self.complete_evaluation(ticket, submitted)
    }

    /// Show the reference answer for the active mission
    ///
    /// Resolves the mission by disclosure: no points, not completed, but the
    /// following mission becomes selectable.
    ///
    /// # Errors
    /// - [`SessionError::EvaluationInFlight`] while an evaluation is pending
    /// - [`SessionError::Store`] if unlocking could not be saved
    pub fn reveal(&mut self) -> Result<Disclosure, SessionError> {
        if self.view.in_flight {
            return Err(SessionError::EvaluationInFlight);
        }
        let catalog = Arc::clone(&self.catalog);
        let mission = self.current_mission()?;
        let mission_id = mission.id;

        let mut next = self.progress.clone();
        next.unlock_after(mission_id, catalog.last_id());
        let unlocked_next = self.commit(next)?;

        self.view.revealed = true;
        self.view.verified = true;
        tracing::info!(mission = %mission_id, unlocked_next, "answer revealed");

        let mission = catalog.get(mission_id).ok_or(SessionError::NoActiveMission)?;
        Ok(Disclosure {
            mission_id,
            reference_snippet: mission.reference_snippet.clone(),
            explanation: mission.explanation.clone(),
            unlocked_next,
        })
    }

    /// Make `id` the active mission with a fresh view
    ///
    /// Any pending evaluation is superseded.
    ///
    /// # Errors
    /// - [`SessionError::UnknownMission`] if `id` is not in the catalog
    /// - [`SessionError::MissionLocked`] if `id` is above the watermark
    pub fn select_mission(&mut self, id: MissionId) -> Result<(), SessionError> {
        if !self.catalog.contains(id) {
            return Err(SessionError::UnknownMission(id));
        }
        if self.progress.is_locked(id) {
            return Err(SessionError::MissionLocked(id));
        }

        let mut next = self.progress.clone();
        next.ratchet(id);
        self.commit(next)?;

        self.epoch += 1;
        self.view = MissionViewState::fresh(id, self.progress.is_completed(id));
        tracing::debug!(mission = %id, "mission selected");
        Ok(())
    }

    /// Advance from a resolved mission
    ///
    /// # Errors
    /// - [`SessionError::NotResolved`] unless the active mission is verified
    ///   or revealed
    pub fn next_mission(&mut self) -> Result<NextStep, SessionError> {
        let current = self.view.mission_id;
        if !self.view.verified {
            return Err(SessionError::NotResolved(current));
        }
        if current >= self.catalog.last_id() {
            let certificate = Certificate::issue(&self.progress, self.catalog.len());
            tracing::info!(points = certificate.points, rank = %certificate.rank, "course complete");
            return Ok(NextStep::CourseComplete { certificate });
        }
        let id = current.next();
        self.select_mission(id)?;
        Ok(NextStep::Mission { id })
    }

    /// Record that the onboarding tutorial was dismissed
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] if the flag could not be saved.
    pub fn mark_onboarding_seen(&mut self) -> Result<(), SessionError> {
        let mut next = self.progress.clone();
        next.onboarding_seen = true;
        self.commit(next)?;
        Ok(())
    }

    /// Clear all persisted progress and return to mission 1
    ///
    /// Any pending evaluation is superseded.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] if the store could not be cleared; the
    /// session is then unchanged.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        self.epoch += 1;
        self.progress.reset();
        self.view = MissionViewState::fresh(MissionId::FIRST, false);
        tracing::info!("progress reset");
        Ok(())
    }

    /// Whether `ticket` still refers to the active view
    ///
    /// False once a reset or mission change has happened since it was issued.
    #[inline]
    #[must_use]
    pub fn is_ticket_current(&self, ticket: EvaluationTicket) -> bool {
        ticket.epoch == self.epoch && ticket.mission_id == self.view.mission_id
    }

    // Saves `next` and adopts it; returns whether anything changed.
    fn commit(&mut self, next: ProgressState) -> Result<bool, StoreError> {
        if next == self.progress {
            return Ok(false);
        }
        self.store.save(&next)?;
        self.progress = next;
        Ok(true)
    }
}

fn contain_panic(
    mission_id: MissionId,
    evaluate: impl FnOnce() -> SubmissionResult,
) -> SubmissionResult {
    panic::catch_unwind(AssertUnwindSafe(evaluate)).unwrap_or_else(|_| {
        tracing::warn!(mission = %mission_id, "evaluation panicked");
        SubmissionResult::fault(mission_id)
    })
}
