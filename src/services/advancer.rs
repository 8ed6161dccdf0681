//! Queue advancement: who plays next once a student finishes.

use tracing::{debug, info, warn};

use crate::{
    dto::events::{ServerEvent, TurnAdvancedEvent},
    engine::{GameEngine, models::StudentId},
    services::{alert_service, session_service},
    state::{AlertKind, SharedState},
};

/// Advance the turn after the given student completed their run.
///
/// Resolves the student's roster position and hands off to
/// [`advance_from`]; a completed id the roster does not know falls back to
/// the current turn pointer.
pub async fn advance_after(state: &SharedState, completed_id: StudentId) {
    let position = {
        let guard = state.session().read().await;
        let Some(session) = guard.as_ref() else {
            return;
        };
        session
            .position_of(completed_id)
            .unwrap_or_else(|| session.active_index())
    };

    advance_from(state, position).await;
}

/// Move the turn pointer to the next eligible student after `position` and
/// signal the engine to start them.
///
/// When nobody is eligible the roster is exhausted and the terminal path
/// runs instead. An engine rejection of the start signal raises an alert
/// but leaves roster and completion state untouched.
pub async fn advance_from(state: &SharedState, position: usize) {
    let next = {
        let mut guard = state.session().write().await;
        let Some(session) = guard.as_mut() else {
            return;
        };

        match session.next_eligible_after(position) {
            Some(next_index) => {
                session.set_active_index(next_index);
                let student = &session.roster()[next_index];
                Some((session.game_id, student.id, session.user_id, next_index))
            }
            None => None,
        }
    };

    let Some((game_id, student_id, user_id, next_index)) = next else {
        debug!("no eligible student left; taking the terminal path");
        session_service::complete_session(state).await;
        return;
    };

    if let Ok(event) = ServerEvent::json(
        Some("turn_advanced".to_string()),
        &TurnAdvancedEvent {
            student_id,
            position: next_index,
        },
    ) {
        state.events().broadcast(event);
    }

    let engine = state.engine().await;
    match engine.send_start_signal(game_id, student_id, user_id).await {
        Ok(()) => {
            info!(student_id, position = next_index, "start signal sent");
            if !state.polling_enabled() {
                info!("start signal accepted; resuming polling");
                state.set_polling(true);
            }
        }
        Err(err) => {
            warn!(student_id, error = %err, "engine rejected start signal");
            alert_service::raise(
                state,
                AlertKind::StartSignal,
                format!("Failed to send start signal for student {student_id}: {err}"),
            );
        }
    }
}
