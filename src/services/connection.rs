//! Connection monitor: periodic reachability probes against the engine.

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::{
    dto::events::{ConnectionChangedEvent, ServerEvent},
    engine::GameEngine,
    services::alert_service,
    state::{AlertKind, ConnectionStatus, SharedState},
};

/// Run the probe loop until the session gate closes.
pub async fn run(state: SharedState, mut stop: watch::Receiver<bool>) {
    let interval = state.config().probe_interval;

    check(&state).await;

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
                check(&state).await;
            }
        }
    }

    debug!("connection probe loop stopped");
}

/// Issue one reachability probe and publish the outcome.
///
/// A success clears the failure counter and any standing connection alert.
/// A failure increments the counter and classifies the error into an
/// operator-facing message; roster and completion state are never touched.
pub async fn check(state: &SharedState) -> ConnectionStatus {
    state.set_connection_status(ConnectionStatus::Connecting);

    let engine = state.engine().await;
    match engine.probe().await {
        Ok(()) => {
            state.reset_probe_failures();
            state.set_connection_status(ConnectionStatus::Connected);
            alert_service::clear_kind(state, AlertKind::Connection);
            ConnectionStatus::Connected
        }
        Err(err) => {
            let retries = state.record_probe_failure();
            state.set_connection_status(ConnectionStatus::Disconnected);

            let detail = err.probe_failure().message();
            warn!(error = %err, retries, "engine probe failed");
            alert_service::replace(
                state,
                AlertKind::Connection,
                format!("Cannot reach the engine: {detail}"),
            );
            ConnectionStatus::Disconnected
        }
    }
}

/// Forward connection status changes onto the event stream.
///
/// Runs for the lifetime of the process (not the session): the watch channel
/// closes only when the state itself drops.
pub async fn forward_status_events(state: SharedState) {
    let mut changes = WatchStream::new(state.watch_connection());

    while let Some(status) = changes.next().await {
        let event = ConnectionChangedEvent {
            status: status.into(),
            retry_count: state.probe_failures(),
        };
        if let Ok(payload) = ServerEvent::json(Some("connection".to_string()), &event) {
            state.events().broadcast(payload);
        }

        if status == ConnectionStatus::Connected {
            info!("engine connection established");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::*;

    #[tokio::test]
    async fn probe_success_connects_and_resets_failures() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        assert_eq!(check(&state).await, ConnectionStatus::Connected);
        assert_eq!(state.probe_failures(), 0);
        assert!(state.alerts().is_empty());
    }

    #[tokio::test]
    async fn three_failures_disconnect_without_touching_the_roster() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        for _ in 0..3 {
            stub.push_probe_failure();
        }
        for _ in 0..3 {
            assert_eq!(check(&state).await, ConnectionStatus::Disconnected);
        }

        assert_eq!(state.probe_failures(), 3);
        assert_eq!(state.connection_status(), ConnectionStatus::Disconnected);

        // Roster and completion state are untouched: no spurious advancement.
        let guard = state.session().read().await;
        let session = guard.as_ref().unwrap();
        assert_eq!(session.completed_count(), 0);
        assert_eq!(session.active_index(), 0);
        drop(guard);
        assert!(stub.start_signals().is_empty());

        // A flapping probe keeps exactly one live connection alert.
        assert_eq!(state.alerts().len(), 1);
    }

    #[tokio::test]
    async fn recovery_clears_the_connection_alert() {
        let stub = StubEngine::new();
        let state = running_state(&stub).await;

        stub.push_probe_failure();
        check(&state).await;
        assert_eq!(state.alerts().len(), 1);

        assert_eq!(check(&state).await, ConnectionStatus::Connected);
        assert!(state.alerts().is_empty());
        assert_eq!(state.probe_failures(), 0);
    }
}
