//! Session lifecycle and the operator-triggered operations.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    dto::{
        events::{PhaseChangedEvent, ServerEvent, SessionBegunEvent, SessionCompletedEvent},
        session::{BeginSessionRequest, SessionStatusResponse},
    },
    engine::{GameEngine, http::HttpEngine, mock::MockEngine},
    error::ServiceError,
    services::{advancer, alert_service, connection, poller, scores, summary},
    state::{
        AlertKind, EngineMode, PhaseEvent, PlaySession, RunState, SessionPhase, SharedState,
        Student,
    },
};

/// Begin a play session for the selected roster subset.
///
/// Fetches the game's roster, filters it to the selection, pre-creates the
/// engine-side session for every student (fire-and-forget), installs the
/// session, starts the three sync loops, and signals the first student to
/// play.
pub async fn begin(
    state: &SharedState,
    request: BeginSessionRequest,
) -> Result<SessionStatusResponse, ServiceError> {
    ensure_idle(state).await?;

    let engine = state.engine().await;
    let roster = match engine.fetch_roster(request.game_id).await {
        Ok(roster) => roster,
        Err(err) => {
            warn!(game_id = request.game_id, error = %err, "roster fetch failed");
            alert_service::raise(state, AlertKind::Roster, format!("Roster fetch failed: {err}"));
            return Err(err.into());
        }
    };

    let selected: Vec<Student> = roster
        .into_iter()
        .filter(|entry| request.student_ids.contains(&entry.id))
        .map(Into::into)
        .collect();
    if selected.is_empty() {
        return Err(ServiceError::InvalidInput(
            "none of the selected students belong to this game".into(),
        ));
    }

    let session = PlaySession::new(request.game_id, request.user_id, selected);
    let first_student = session.roster()[0].id;
    let roster_size = session.len();
    let student_ids = session.student_ids();

    // Pre-create each student's engine-side session. Failures are logged
    // only; the play loop can still start students individually.
    for student_id in &student_ids {
        if let Err(err) = engine.start_session(request.game_id, *student_id).await {
            debug!(student_id, error = %err, "session pre-creation failed");
        }
    }

    {
        let mut slot = state.session().write().await;
        *slot = Some(session);
    }

    let phase = match state.apply_phase(PhaseEvent::BeginSession).await {
        Ok(phase) => phase,
        Err(err) => {
            let mut slot = state.session().write().await;
            slot.take();
            return Err(err.into());
        }
    };

    state.set_polling(true);
    spawn_session_loops(state).await;

    broadcast_phase(state, phase);
    if let Ok(event) = ServerEvent::json(
        Some("session_begun".to_string()),
        &SessionBegunEvent {
            game_id: request.game_id,
            roster_size,
            first_student,
        },
    ) {
        state.events().broadcast(event);
    }
    info!(
        game_id = request.game_id,
        roster_size, first_student, "session begun"
    );

    if let Err(err) = engine
        .send_start_signal(request.game_id, first_student, request.user_id)
        .await
    {
        warn!(student_id = first_student, error = %err, "engine rejected first start signal");
        alert_service::raise(
            state,
            AlertKind::StartSignal,
            format!("Failed to send start signal for student {first_student}: {err}"),
        );
    }

    Ok(status(state).await)
}

/// Tear the session down (the page-unmount path).
///
/// Stops every loop, clears the session slot, and returns the phase machine
/// to idle.
pub async fn teardown(state: &SharedState) -> Result<SessionStatusResponse, ServiceError> {
    {
        let guard = state.session().read().await;
        if guard.is_none() {
            return Err(ServiceError::NotFound("no session is loaded".into()));
        }
    }

    state.signal_session_stop().await;
    state.abort_loops().await;
    state.set_polling(false);
    state.clear_cooldown().await;

    {
        let mut slot = state.session().write().await;
        slot.take();
    }

    let phase = state.apply_phase(PhaseEvent::EndSession).await?;
    broadcast_phase(state, phase);
    info!("session torn down");

    Ok(status(state).await)
}

/// Terminal path: the roster is exhausted.
///
/// Idempotent — the first caller (poller or aggregator, whichever observes
/// exhaustion first) wins; later calls find the machine already completed
/// and do nothing. Stops polling, closes the session gate so the loops
/// drain, and publishes the final summary.
pub async fn complete_session(state: &SharedState) {
    let phase = match state.apply_phase(PhaseEvent::AllCompleted).await {
        Ok(phase) => phase,
        Err(err) => {
            debug!(error = %err, "terminal path already taken or no session running");
            return;
        }
    };

    state.set_polling(false);
    state.signal_session_stop().await;
    broadcast_phase(state, phase);

    let summary = {
        let guard = state.session().read().await;
        guard.as_ref().and_then(summary::compute)
    };
    if let Some(summary) = summary {
        if let Ok(event) = ServerEvent::json(
            Some("session_completed".to_string()),
            &SessionCompletedEvent {
                summary: summary.into(),
            },
        ) {
            state.events().broadcast(event);
        }
    }

    info!("all students completed; session loops stopped");
}

/// Manually advance to the next eligible student (operator control).
pub async fn manual_advance(state: &SharedState) -> Result<SessionStatusResponse, ServiceError> {
    ensure_running(state).await?;

    let position = {
        let guard = state.session().read().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| ServiceError::NotFound("no session is loaded".into()))?;
        if session.next_eligible_after(session.active_index()).is_none() {
            return Err(ServiceError::InvalidState(
                "all students have completed their games".into(),
            ));
        }
        session.active_index()
    };

    advancer::advance_from(state, position).await;
    Ok(status(state).await)
}

/// Manual one-shot sync check (operator control).
///
/// Bypasses the polling-enabled flag but honors the single-flight guard and
/// cool-down, so it cannot stampede the engine.
pub async fn sync_check(state: &SharedState) -> Result<SessionStatusResponse, ServiceError> {
    {
        let guard = state.session().read().await;
        if guard.is_none() {
            return Err(ServiceError::NotFound("no session is loaded".into()));
        }
    }
    if state.phase().await.is_completed() {
        return Err(ServiceError::InvalidState(
            "the session is already completed".into(),
        ));
    }

    poller::poll_tick(state, true).await;
    Ok(status(state).await)
}

/// Manual batched score refresh (operator control).
pub async fn refresh_scores(state: &SharedState) -> Result<SessionStatusResponse, ServiceError> {
    scores::refresh(state).await?;
    Ok(status(state).await)
}

/// Enable or disable the poll loop (operator control).
pub async fn set_polling(
    state: &SharedState,
    enabled: bool,
) -> Result<SessionStatusResponse, ServiceError> {
    ensure_running(state).await?;
    state.set_polling(enabled);
    info!(enabled, "polling toggled");
    Ok(status(state).await)
}

/// Restart polling: clears any cool-down and re-enables the loop.
pub async fn restart_polling(state: &SharedState) -> Result<SessionStatusResponse, ServiceError> {
    ensure_running(state).await?;
    state.clear_cooldown().await;
    state.set_polling(true);
    info!("polling restarted");
    Ok(status(state).await)
}

/// Current summary over the recorded scores.
pub async fn session_summary(state: &SharedState) -> Result<summary::GameSummary, ServiceError> {
    let guard = state.session().read().await;
    let session = guard
        .as_ref()
        .ok_or_else(|| ServiceError::NotFound("no session is loaded".into()))?;
    summary::compute(session)
        .ok_or_else(|| ServiceError::NotFound("no scores recorded yet".into()))
}

/// Point the live engine client at a different base URL (operator override).
pub async fn set_engine_url(state: &SharedState, base_url: &str) -> Result<(), ServiceError> {
    if state.phase().await.mode == EngineMode::Mock {
        return Err(ServiceError::InvalidState(
            "cannot change the engine URL while in mock mode".into(),
        ));
    }

    let engine = HttpEngine::connect(base_url, state.config().request_timeout)?;
    state.install_engine(Arc::new(engine)).await;
    state.set_live_engine_url(base_url.to_string()).await;
    info!(base_url, "engine base URL overridden");

    connection::check(state).await;
    Ok(())
}

/// Switch between the live engine and the offline mock (operator toggle).
///
/// Enabling the mock while a session is loaded replaces the roster and
/// scores with the fabricated world, so the operator immediately sees demo
/// data. Disabling it re-installs the live client for the configured URL;
/// whatever session is loaded stays as it is.
pub async fn set_mode(state: &SharedState, mode: EngineMode) -> Result<SessionPhase, ServiceError> {
    let phase = match mode {
        EngineMode::Mock => {
            let phase = state.apply_phase(PhaseEvent::EnableMock).await?;
            let mock = Arc::new(MockEngine::seeded());
            state.install_engine(mock.clone()).await;

            let loaded = {
                let guard = state.session().read().await;
                guard.as_ref().map(|session| (session.game_id, session.user_id))
            };
            if let Some((game_id, user_id)) = loaded {
                let roster = mock.fetch_roster(game_id).await?;
                let mut session =
                    PlaySession::new(game_id, user_id, roster.into_iter().map(Into::into).collect());
                let ids = session.student_ids();
                let fabricated = mock.all_scores(game_id, &ids).await?;
                session.replace_scores(crate::engine::models::completed_scores(&fabricated));

                let mut slot = state.session().write().await;
                *slot = Some(session);
            }

            connection::check(state).await;
            phase
        }
        EngineMode::Live => {
            let phase = state.apply_phase(PhaseEvent::DisableMock).await?;
            let base_url = state.live_engine_url().await;
            let engine = HttpEngine::connect(&base_url, state.config().request_timeout)?;
            state.install_engine(Arc::new(engine)).await;
            connection::check(state).await;
            phase
        }
    };

    broadcast_phase(state, phase);
    info!(?mode, "engine mode switched");
    Ok(phase)
}

/// Build the status view of the loaded session.
pub async fn status(state: &SharedState) -> SessionStatusResponse {
    let phase = state.phase().await;
    let engine_endpoint = state.engine().await.endpoint();
    let guard = state.session().read().await;
    SessionStatusResponse::build(
        phase,
        state.connection_status().into(),
        state.polling_enabled(),
        engine_endpoint,
        guard.as_ref(),
    )
}

async fn ensure_idle(state: &SharedState) -> Result<(), ServiceError> {
    if state.phase().await.run != RunState::Idle {
        return Err(ServiceError::InvalidState(
            "a session is already loaded".into(),
        ));
    }
    Ok(())
}

async fn ensure_running(state: &SharedState) -> Result<(), ServiceError> {
    if !state.phase().await.is_running() {
        return Err(ServiceError::InvalidState(
            "no session is running".into(),
        ));
    }
    Ok(())
}

fn broadcast_phase(state: &SharedState, phase: SessionPhase) {
    if let Ok(event) = ServerEvent::json(
        Some("phase".to_string()),
        &PhaseChangedEvent(phase.into()),
    ) {
        state.events().broadcast(event);
    }
}

/// Spawn the three session loops wired to a fresh stop gate.
async fn spawn_session_loops(state: &SharedState) {
    let gate = state.reset_session_gate().await;

    let poll_state = state.clone();
    let poll_gate = gate.clone();
    state
        .register_loop(tokio::spawn(async move {
            poller::run(poll_state, poll_gate).await;
        }))
        .await;

    let score_state = state.clone();
    let score_gate = gate.clone();
    state
        .register_loop(tokio::spawn(async move {
            scores::run(score_state, score_gate).await;
        }))
        .await;

    let probe_state = state.clone();
    state
        .register_loop(tokio::spawn(async move {
            connection::run(probe_state, gate).await;
        }))
        .await;
}
