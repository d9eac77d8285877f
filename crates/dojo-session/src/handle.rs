//! Paced async session handle
//!
//! Wraps a [`Session`] for concurrent callers. A submission waits out the
//! configured feedback delay before its verdict is computed; a reset or
//! mission change during the wait cancels it. The session lock is never held
//! across an `.await`.

use crate::error::SessionError;
use crate::session::{
    Disclosure, EvaluationSnapshot, EvaluationTicket, NextStep, Session, SessionSnapshot,
};
use crate::store::ProgressStore;
use dojo_core::MissionId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Cloneable async handle to a shared session
#[derive(Debug)]
pub struct SessionHandle<S> {
    inner: Arc<Mutex<Session<S>>>,
    cancel: Arc<Notify>,
    delay: Duration,
}

impl<S> Clone for SessionHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: Arc::clone(&self.cancel),
            delay: self.delay,
        }
    }
}

impl<S: ProgressStore> SessionHandle<S> {
    /// Wrap a session, pacing with its configured feedback delay
    #[must_use]
    pub fn new(session: Session<S>) -> Self {
        let delay = session.config().feedback_delay();
        Self {
            inner: Arc::new(Mutex::new(session)),
            cancel: Arc::new(Notify::new()),
            delay,
        }
    }

    /// Override the pacing delay
    #[inline]
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Pacing delay
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Submit an edited snippet for the active mission
    ///
    /// # Errors
    /// - [`SessionError::EvaluationInFlight`] if another submission is pending
    /// - [`SessionError::Superseded`] if reset or a mission change happened
    ///   during the delay
    /// - any error of [`Session::complete_evaluation`]
    pub async fn submit(&self, submitted: &str) -> Result<EvaluationSnapshot, SessionError> {
        let ticket = self.inner.lock().begin_evaluation()?;
        let mut guard = PendingEvaluation {
            session: &self.inner,
            ticket: Some(ticket),
        };

        if !self.delay.is_zero() {
            let cancelled = self.cancel.notified();
            // A reset between claiming and listening has already notified.
            if !self.inner.lock().is_ticket_current(ticket) {
                return Err(SessionError::Superseded);
            }
            tokio::select! {
                () = tokio::time::sleep(self.delay) => {}
                () = cancelled => {
                    tracing::debug!(mission = %ticket.mission_id(), "pending evaluation cancelled");
                    return Err(SessionError::Superseded);
                }
            }
        }

        guard.disarm();
        self.inner.lock().complete_evaluation(ticket, submitted)
    }

    /// See [`Session::reveal`]
    ///
    /// # Errors
    /// See [`Session::reveal`].
    pub fn reveal(&self) -> Result<Disclosure, SessionError> {
        self.inner.lock().reveal()
    }

    /// See [`Session::select_mission`]; cancels a pending submission
    ///
    /// # Errors
    /// See [`Session::select_mission`].
    pub fn select_mission(&self, id: MissionId) -> Result<(), SessionError> {
        self.inner.lock().select_mission(id)?;
        self.cancel.notify_waiters();
        Ok(())
    }

    /// See [`Session::next_mission`]; cancels a pending submission
    ///
    /// # Errors
    /// See [`Session::next_mission`].
    pub fn next_mission(&self) -> Result<NextStep, SessionError> {
        let step = self.inner.lock().next_mission()?;
        if matches!(step, NextStep::Mission { .. }) {
            self.cancel.notify_waiters();
        }
        Ok(step)
    }

    /// See [`Session::mark_onboarding_seen`]
    ///
    /// # Errors
    /// See [`Session::mark_onboarding_seen`].
    pub fn mark_onboarding_seen(&self) -> Result<(), SessionError> {
        self.inner.lock().mark_onboarding_seen()
    }

    /// See [`Session::reset`]; cancels a pending submission
    ///
    /// # Errors
    /// See [`Session::reset`].
    pub fn reset(&self) -> Result<(), SessionError> {
        self.inner.lock().reset()?;
        self.cancel.notify_waiters();
        Ok(())
    }

    /// Current view and progress
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }

    /// Run `f` against the session under the lock
    pub fn with_session<R>(&self, f: impl FnOnce(&Session<S>) -> R) -> R {
        f(&*self.inner.lock())
    }
}

// Frees the evaluation slot if the submitting future is dropped or cancelled
// before the verdict.
struct PendingEvaluation<'a, S: ProgressStore> {
    session: &'a Mutex<Session<S>>,
    ticket: Option<EvaluationTicket>,
}

impl<S: ProgressStore> PendingEvaluation<'_, S> {
    fn disarm(&mut self) {
        self.ticket = None;
    }
}

impl<S: ProgressStore> Drop for PendingEvaluation<'_, S> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.session.lock().abandon_evaluation(ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use dojo_core::{Catalog, EngineConfig, Mission, Outcome};

    fn handle(delay: Duration) -> SessionHandle<MemoryStore> {
        let mission = Mission::new(1, "one", "a = old()", "a = new()").with_keywords(["new"]);
        let catalog = Catalog::from_missions(vec![mission]).unwrap();
        let config = EngineConfig::new().with_feedback_delay(delay);
        SessionHandle::new(Session::open(catalog, MemoryStore::new(), config))
    }

    #[tokio::test(start_paused = true)]
    async fn verdict_arrives_after_delay() {
        let handle = handle(Duration::from_millis(1200));
        let started = tokio::time::Instant::now();
        let snapshot = handle.submit("a = new()").await.unwrap();
        assert_eq!(snapshot.result.outcome, Outcome::Accepted);
        assert!(started.elapsed() >= Duration::from_millis(1200));
    }

    #[tokio::test]
    async fn zero_delay_is_immediate() {
        let handle = handle(Duration::ZERO);
        let snapshot = handle.submit("a = other()").await.unwrap();
        assert_eq!(snapshot.result.outcome, Outcome::MissingRequired);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reset_from_another_thread_cancels_promptly() {
        let handle = handle(Duration::from_secs(60));
        let pending = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.submit("a = new()").await })
        };
        while !handle.snapshot().view.in_flight {
            tokio::task::yield_now().await;
        }

        handle.reset().unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(5), pending)
            .await
            .expect("superseded submission must not wait out the delay")
            .unwrap();
        assert!(matches!(outcome, Err(SessionError::Superseded)));
        assert!(!handle.snapshot().view.in_flight);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submission_frees_slot() {
        let handle = handle(Duration::from_secs(5));
        let pending = handle.submit("a = new()");
        let timed_out = tokio::time::timeout(Duration::from_secs(1), pending).await;
        assert!(timed_out.is_err());
        assert!(!handle.snapshot().view.in_flight);
    }
}
