//! Score aggregator: batched authoritative refresh of the completion map.

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    dto::events::{ScoresRefreshedEvent, ServerEvent},
    engine::{GameEngine, models::completed_scores},
    error::ServiceError,
    services::{alert_service, session_service},
    state::{AlertKind, SharedState},
};

/// Run the refresh loop until the session gate closes.
///
/// Refreshes once immediately (the session just began and the engine may
/// already hold scores from an earlier attempt), then on the coarse cadence.
pub async fn run(state: SharedState, mut stop: watch::Receiver<bool>) {
    let interval = state.config().score_refresh_interval;

    if let Err(err) = refresh(&state).await {
        debug!(error = %err, "initial score refresh failed");
    }

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
                if let Err(err) = refresh(&state).await {
                    debug!(error = %err, "periodic score refresh failed");
                }
            }
        }
    }

    debug!("score refresh loop stopped");
}

/// Fetch the batched scores and replace the completion map wholesale.
///
/// The response is the engine's truth: it corrects any drift from missed
/// poll ticks, and applying it twice with unchanged data is a no-op. After
/// the replace, the turn pointer is reconciled — onto the last completed
/// student when the roster is exhausted (which also takes the terminal
/// path), otherwise onto the first student still waiting to play.
pub async fn refresh(state: &SharedState) -> Result<ScoresRefreshedEvent, ServiceError> {
    let (game_id, student_ids) = {
        let guard = state.session().read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| ServiceError::NotFound("no session is loaded".into()))?;
        (session.game_id, session.student_ids())
    };

    let engine = state.engine().await;
    let scores = match engine.all_scores(game_id, &student_ids).await {
        Ok(scores) => scores,
        Err(err) => {
            warn!(error = %err, "batched score fetch failed");
            alert_service::raise(state, AlertKind::Scores, format!("Score refresh failed: {err}"));
            return Err(err.into());
        }
    };

    let truth = completed_scores(&scores);
    let (event, exhausted) = {
        let mut guard = state.session().write().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| ServiceError::NotFound("no session is loaded".into()))?;

        session.replace_scores(truth);

        let exhausted = session.is_exhausted();
        if exhausted {
            if let Some(last) = session.last_completed() {
                session.adopt_active(last);
            }
        } else if let Some(first) = session.first_pending() {
            session.set_active_index(first);
        }

        (
            ScoresRefreshedEvent {
                completed_count: session.completed_count(),
                roster_size: session.len(),
            },
            exhausted,
        )
    };

    if let Ok(payload) = ServerEvent::json(Some("scores_refreshed".to_string()), &event) {
        state.events().broadcast(payload);
    }

    if exhausted {
        session_service::complete_session(state).await;
    }

    Ok(event)
}
