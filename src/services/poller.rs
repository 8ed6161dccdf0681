//! Session poller: observes the engine's sync status on a fixed cadence.

use std::time::Instant;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    dto::events::{CompletionEvent, ServerEvent},
    engine::{GameEngine, models::SyncSnapshot},
    services::{advancer, alert_service, session_service},
    state::{AlertKind, MAX_SCORE, SharedState},
};

/// Run the poll loop until the session gate closes.
///
/// The loop wakes on the configured cadence and delegates to [`poll_tick`];
/// a closed or signalled gate ends it, as does a terminal phase observed at
/// wake-up.
pub async fn run(state: SharedState, mut stop: watch::Receiver<bool>) {
    let interval = state.config().poll_interval;

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = sleep(interval) => {
                if state.phase().await.is_completed() {
                    break;
                }
                poll_tick(&state, false).await;
            }
        }
    }

    debug!("sync poll loop stopped");
}

/// Issue one sync poll and apply whatever it reports.
///
/// Skipped when polling is disabled (unless `force`, the manual-check path),
/// during a resource-exhaustion cool-down, or when another poll is still in
/// flight (single-flight guard). Returns whether a snapshot was applied.
pub async fn poll_tick(state: &SharedState, force: bool) -> bool {
    if !force && !state.polling_enabled() {
        return false;
    }

    if state.in_cooldown().await {
        debug!("polling paused by cool-down; skipping tick");
        return false;
    }

    let Ok(_guard) = state.poll_gate().try_lock() else {
        debug!("sync request already in flight; skipping tick");
        return false;
    };

    // Roster already exhausted (e.g. the aggregator saw it first): make sure
    // the terminal path ran and stop issuing calls.
    let exhausted = {
        let guard = state.session().read().await;
        match guard.as_ref() {
            Some(session) => session.is_exhausted(),
            None => return false,
        }
    };
    if exhausted {
        session_service::complete_session(state).await;
        return false;
    }

    let engine = state.engine().await;
    match engine.sync_status().await {
        Ok(snapshot) => {
            apply_snapshot(state, snapshot).await;
            true
        }
        Err(err) if err.is_resource_exhausted() => {
            warn!(error = %err, "engine shedding load; pausing polling");
            let until = Instant::now() + state.config().exhaustion_cooldown;
            state.start_cooldown(until).await;
            false
        }
        Err(err) => {
            warn!(error = %err, "sync poll failed");
            alert_service::raise(state, AlertKind::Sync, format!("Sync poll failed: {err}"));
            false
        }
    }
}

/// Fold one snapshot into the session.
///
/// The engine is authoritative for who is currently playing, so a reported
/// active student always moves the turn pointer. A fresh completion records
/// the score and, after a short settle delay, hands off to the queue
/// advancer; anything malformed, empty, or already known is a no-op tick.
async fn apply_snapshot(state: &SharedState, snapshot: SyncSnapshot) {
    if snapshot.is_empty() {
        debug!("empty sync snapshot; no update this tick");
        return;
    }

    let mut recorded = None;
    {
        let mut guard = state.session().write().await;
        let Some(session) = guard.as_mut() else {
            return;
        };

        if let Some(active_id) = snapshot.student_id
            && session.adopt_active(active_id).is_none()
        {
            debug!(student_id = active_id, "sync reported a student outside the roster");
        }

        if let Some((student_id, score)) = snapshot.completion() {
            if score > MAX_SCORE {
                warn!(student_id, score, "score out of range; ignoring snapshot");
            } else if session.record_completion(student_id, score) {
                recorded = Some(CompletionEvent {
                    student_id,
                    score,
                    completed_count: session.completed_count(),
                    roster_size: session.len(),
                });
            } else {
                debug!(student_id, "completion already recorded; skipping");
            }
        }
    }

    let Some(completion) = recorded else {
        return;
    };

    let student_id = completion.student_id;
    if let Ok(event) = ServerEvent::json(Some("completion".to_string()), &completion) {
        state.events().broadcast(event);
    }

    // Let the engine settle the finished run before the next start signal.
    sleep(state.config().advance_settle_delay).await;
    advancer::advance_after(state, student_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::EngineError;
    use crate::services::{session_service, test_support::*};
    use crate::state::AlertKind;

    fn completed(student_id: i64, score: u16) -> SyncSnapshot {
        SyncSnapshot {
            student_id: Some(student_id),
            completed: Some(true),
            score: Some(score),
        }
    }

    #[tokio::test]
    async fn full_roster_runs_to_terminal_state() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        stub.push_snapshot(completed(1, 92));
        assert!(poll_tick(&state, false).await);
        stub.push_snapshot(completed(2, 81));
        assert!(poll_tick(&state, false).await);
        stub.push_snapshot(completed(3, 77));
        assert!(poll_tick(&state, false).await);

        // Advancement went A -> B -> C; the last completion found nobody
        // eligible and took the terminal path instead of signalling.
        assert_eq!(stub.start_signals(), vec![2, 3]);
        assert!(state.phase().await.is_completed());
        assert!(!state.polling_enabled());

        let summary = session_service::session_summary(&state).await.unwrap();
        assert_eq!(summary.highest.score, 92);
        assert_eq!(summary.lowest.score, 77);
        assert!((summary.average - 83.333_333).abs() < 1e-4);

        // Terminal state issues no further sync calls or start signals,
        // even for a forced manual check.
        let calls_before = stub.sync_calls();
        assert!(!poll_tick(&state, false).await);
        assert!(!poll_tick(&state, true).await);
        assert_eq!(stub.sync_calls(), calls_before);
        assert_eq!(stub.start_signals(), vec![2, 3]);
    }

    #[tokio::test]
    async fn duplicate_completion_records_once_and_signals_once() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        stub.push_snapshot(completed(1, 92));
        stub.push_snapshot(completed(1, 92));
        poll_tick(&state, false).await;
        poll_tick(&state, false).await;

        let guard = state.session().read().await;
        let session = guard.as_ref().unwrap();
        assert_eq!(session.completed_count(), 1);
        assert_eq!(session.score_of(1), Some(92));
        drop(guard);

        assert_eq!(stub.start_signals(), vec![2]);
    }

    #[tokio::test]
    async fn empty_snapshot_is_a_no_op_tick() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        assert!(poll_tick(&state, false).await);

        let guard = state.session().read().await;
        let session = guard.as_ref().unwrap();
        assert_eq!(session.completed_count(), 0);
        assert_eq!(session.active_index(), 0);
    }

    #[tokio::test]
    async fn engine_active_student_is_adopted() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        stub.push_snapshot(SyncSnapshot {
            student_id: Some(3),
            completed: Some(false),
            score: None,
        });
        poll_tick(&state, false).await;

        let guard = state.session().read().await;
        assert_eq!(guard.as_ref().unwrap().active_index(), 2);
    }

    #[tokio::test]
    async fn resource_exhaustion_pauses_polling() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        stub.push_sync_error(EngineError::ResourceExhausted {
            path: "gamesession/ui-sync-status".into(),
        });
        assert!(!poll_tick(&state, false).await);
        assert!(state.in_cooldown().await);

        // The next tick skips without touching the engine.
        let calls_before = stub.sync_calls();
        assert!(!poll_tick(&state, false).await);
        assert_eq!(stub.sync_calls(), calls_before);
    }

    #[tokio::test]
    async fn out_of_range_score_is_ignored() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        stub.push_snapshot(completed(1, 250));
        poll_tick(&state, false).await;

        let guard = state.session().read().await;
        assert_eq!(guard.as_ref().unwrap().completed_count(), 0);
        drop(guard);
        assert!(stub.start_signals().is_empty());
    }

    #[tokio::test]
    async fn sync_failure_raises_a_dismissible_alert() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        stub.push_sync_error(EngineError::Timeout {
            path: "gamesession/ui-sync-status".into(),
        });
        poll_tick(&state, false).await;

        let alerts: Vec<_> = state
            .alerts()
            .iter()
            .map(|entry| entry.value().kind)
            .collect();
        assert_eq!(alerts, vec![AlertKind::Sync]);
    }

    #[tokio::test]
    async fn disabled_polling_skips_unless_forced() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;
        state.set_polling(false);

        assert!(!poll_tick(&state, false).await);
        assert_eq!(stub.sync_calls(), 0);

        assert!(poll_tick(&state, true).await);
        assert_eq!(stub.sync_calls(), 1);
    }
}
