//! End-to-end session behavior against in-memory and file stores.

use dojo_core::{MissionId, MissionState, Outcome, ProgressState, Rank};
use dojo_session::{
    JsonFileStore, MemoryStore, NextStep, ProgressStore, Session, SessionError, SessionHandle,
};
use dojo_test_utils::{answer_for, create_test_catalog, instant_config};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn memory_session(missions: u32) -> (Session<Arc<MemoryStore>>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session = Session::open(create_test_catalog(missions), Arc::clone(&store), instant_config());
    (session, store)
}

#[test]
fn worked_example_scores_and_penalizes() {
    let (mut session, store) = memory_session(3);

    let unchanged = session.submit("def f(d); d.sort!; d.reverse!; end").unwrap();
    assert_eq!(unchanged.result.outcome, Outcome::Unchanged);
    assert_eq!(unchanged.accuracy.get(), 90);

    let missing = session.submit("def f(d); d.sort; end").unwrap();
    assert_eq!(missing.result.outcome, Outcome::MissingRequired);
    assert_eq!(missing.accuracy.get(), 80);
    assert_eq!(missing.score_delta, 0);

    let accepted = session.submit("def f(d); d.sort.reverse; end").unwrap();
    assert_eq!(accepted.result.outcome, Outcome::Accepted);
    assert_eq!(accepted.score_delta, 100);
    assert_eq!(accepted.accuracy.get(), 100);
    assert_eq!(accepted.progress.score, 100);
    assert!(accepted.progress.is_completed(MissionId(1)));
    assert_eq!(accepted.progress.state_of(MissionId(2)), MissionState::Unlocked);
    assert_eq!(store.save_count(), 1);
}

#[test]
fn accepting_twice_scores_once() {
    let (mut session, store) = memory_session(2);
    session.submit(&answer_for(MissionId(1))).unwrap();
    let again = session.submit(&answer_for(MissionId(1))).unwrap();

    assert_eq!(again.result.outcome, Outcome::Accepted);
    assert_eq!(again.score_delta, 0);
    assert_eq!(session.progress().score, 100);
    assert_eq!(store.save_count(), 1);
}

#[test]
fn reveal_resolves_without_scoring() {
    let (mut session, store) = memory_session(3);

    let disclosure = session.reveal().unwrap();
    assert_eq!(disclosure.mission_id, MissionId(1));
    assert!(disclosure.unlocked_next);

    let progress = session.progress();
    assert!(!progress.is_completed(MissionId(1)));
    assert_eq!(progress.score, 0);
    assert_eq!(progress.state_of(MissionId(2)), MissionState::Unlocked);
    assert!(session.view().verified);
    assert!(session.view().revealed);
    assert_eq!(store.save_count(), 1);

    assert_eq!(session.next_mission().unwrap(), NextStep::Mission { id: MissionId(2) });
}

#[test]
fn assisted_submission_neither_completes_nor_scores() {
    let (mut session, store) = memory_session(2);
    session.reveal().unwrap();

    let snapshot = session.submit(&answer_for(MissionId(1))).unwrap();
    assert_eq!(snapshot.result.outcome, Outcome::Accepted);
    assert!(snapshot.assisted);
    assert_eq!(snapshot.score_delta, 0);
    assert!(!session.progress().is_completed(MissionId(1)));
    assert_eq!(store.save_count(), 1);
}

#[test]
fn locked_and_unknown_missions_cannot_be_selected() {
    let (mut session, _) = memory_session(3);
    assert!(matches!(
        session.select_mission(MissionId(2)),
        Err(SessionError::MissionLocked(MissionId(2)))
    ));
    assert!(matches!(
        session.select_mission(MissionId(9)),
        Err(SessionError::UnknownMission(MissionId(9)))
    ));
    assert_eq!(session.view().mission_id, MissionId(1));
}

#[test]
fn accuracy_resets_on_mission_change() {
    let (mut session, _) = memory_session(2);
    session.submit("nothing useful").unwrap();
    session.submit(&answer_for(MissionId(1))).unwrap();
    session.next_mission().unwrap();

    assert_eq!(session.view().mission_id, MissionId(2));
    assert!(!session.view().verified);
    assert_eq!(session.snapshot().accuracy.get(), 100);
}

#[test]
fn watermark_survives_revisiting_earlier_missions() {
    let (mut session, _) = memory_session(4);
    for id in 1..=3 {
        session.submit(&answer_for(MissionId(id))).unwrap();
        session.next_mission().unwrap();
    }
    session.select_mission(MissionId(1)).unwrap();

    assert_eq!(session.progress().furthest_reached, MissionId(4));
    assert!(session.view().verified);
    assert!(session.select_mission(MissionId(4)).is_ok());
}

#[test]
fn last_mission_issues_certificate() {
    let (mut session, _) = memory_session(2);
    session.submit(&answer_for(MissionId(1))).unwrap();
    session.next_mission().unwrap();
    session.submit(&answer_for(MissionId(2))).unwrap();

    match session.next_mission().unwrap() {
        NextStep::CourseComplete { certificate } => {
            assert_eq!(certificate.points, 200);
            assert_eq!(certificate.rank, Rank::C);
            assert_eq!(certificate.completed_count, 2);
            assert_eq!(certificate.total_missions, 2);
        }
        other => panic!("expected certificate, got {other:?}"),
    }
}

#[test]
fn reset_restores_initial_state() {
    let (mut session, store) = memory_session(3);
    session.mark_onboarding_seen().unwrap();
    session.submit(&answer_for(MissionId(1))).unwrap();
    session.next_mission().unwrap();

    session.reset().unwrap();

    assert_eq!(*session.progress(), ProgressState::new());
    assert_eq!(session.view().mission_id, MissionId(1));
    assert!(store.raw().is_none());
    assert_eq!(
        session.mission_states()[..2].to_vec(),
        vec![
            (MissionId(1), MissionState::Unlocked),
            (MissionId(2), MissionState::Locked),
        ]
    );
}

#[test]
fn reopening_resumes_progress() {
    let store = Arc::new(MemoryStore::new());
    {
        let mut session =
            Session::open(create_test_catalog(3), Arc::clone(&store), instant_config());
        session.submit(&answer_for(MissionId(1))).unwrap();
    }

    let session = Session::open(create_test_catalog(3), Arc::clone(&store), instant_config());
    assert_eq!(session.progress().score, 100);
    assert_eq!(session.view().mission_id, MissionId(2));
}

#[test]
fn progress_from_larger_catalog_is_reconciled() {
    let store = Arc::new(MemoryStore::new());
    {
        let mut session =
            Session::open(create_test_catalog(5), Arc::clone(&store), instant_config());
        for id in 1..=4 {
            session.submit(&answer_for(MissionId(id))).unwrap();
            session.next_mission().unwrap();
        }
    }

    let session = Session::open(create_test_catalog(2), Arc::clone(&store), instant_config());
    let completed: Vec<_> = session.progress().completed.iter().copied().collect();
    assert_eq!(completed, vec![MissionId(1), MissionId(2)]);
    assert_eq!(session.progress().furthest_reached, MissionId(2));
}

#[test]
fn file_store_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("progress.json");

    {
        let mut session =
            Session::open(create_test_catalog(3), JsonFileStore::new(&path), instant_config());
        session.submit(&answer_for(MissionId(1))).unwrap();
        session.mark_onboarding_seen().unwrap();
    }

    let loaded = JsonFileStore::new(&path).load();
    assert_eq!(loaded.score, 100);
    assert!(loaded.onboarding_seen);
    assert_eq!(loaded.furthest_reached, MissionId(2));

    let mut session =
        Session::open(create_test_catalog(3), JsonFileStore::new(&path), instant_config());
    session.reset().unwrap();
    assert!(!path.exists());
}

#[test]
fn corrupt_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert_eq!(JsonFileStore::new(&path).load(), ProgressState::new());
}

#[tokio::test(start_paused = true)]
async fn overlapping_submission_is_rejected_and_reset_supersedes() {
    let session = Session::open(create_test_catalog(2), MemoryStore::new(), instant_config());
    let handle = SessionHandle::new(session).with_delay(Duration::from_secs(60));

    let pending = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.submit(&answer_for(MissionId(1))).await })
    };
    while !handle.snapshot().view.in_flight {
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        handle.submit("anything").await,
        Err(SessionError::EvaluationInFlight)
    ));

    handle.reset().unwrap();
    let outcome = pending.await.unwrap();
    assert!(matches!(outcome, Err(SessionError::Superseded)));
    assert_eq!(handle.snapshot().progress, ProgressState::new());
    assert!(!handle.snapshot().view.in_flight);
}

#[tokio::test(start_paused = true)]
async fn paced_submission_completes_mission() {
    let session = Session::open(create_test_catalog(2), MemoryStore::new(), instant_config());
    let handle = SessionHandle::new(session).with_delay(Duration::from_millis(1200));

    let snapshot = handle.submit(&answer_for(MissionId(1))).await.unwrap();
    assert_eq!(snapshot.score_delta, 100);
    assert!(handle.with_session(|s| s.progress().is_completed(MissionId(1))));
}
