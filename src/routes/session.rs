//! Routes driving the play session lifecycle and the operator controls.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::session::{BeginSessionRequest, PollingRequest, SessionStatusResponse, SummaryResponse},
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Configure the session routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/session", post(begin_session))
        .route("/session", get(session_status))
        .route("/session", delete(end_session))
        .route("/session/advance", post(advance))
        .route("/session/sync-check", post(sync_check))
        .route("/session/scores/refresh", post(refresh_scores))
        .route("/session/polling", put(set_polling))
        .route("/session/polling/restart", post(restart_polling))
        .route("/session/summary", get(session_summary))
}

/// Begin a play session for the selected students.
#[utoipa::path(
    post,
    path = "/session",
    tag = "session",
    request_body = BeginSessionRequest,
    responses(
        (status = 200, description = "Session begun", body = SessionStatusResponse)
    )
)]
pub async fn begin_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<BeginSessionRequest>>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let status = session_service::begin(&state, payload).await?;
    Ok(Json(status))
}

/// Current status of the loaded session.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Session status", body = SessionStatusResponse)
    )
)]
pub async fn session_status(State(state): State<SharedState>) -> Json<SessionStatusResponse> {
    Json(session_service::status(&state).await)
}

/// Tear the session down and stop every sync loop.
#[utoipa::path(
    delete,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Session torn down", body = SessionStatusResponse)
    )
)]
pub async fn end_session(
    State(state): State<SharedState>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let status = session_service::teardown(&state).await?;
    Ok(Json(status))
}

/// Manually advance to the next eligible student.
#[utoipa::path(
    post,
    path = "/session/advance",
    tag = "session",
    responses(
        (status = 200, description = "Turn advanced", body = SessionStatusResponse)
    )
)]
pub async fn advance(
    State(state): State<SharedState>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let status = session_service::manual_advance(&state).await?;
    Ok(Json(status))
}

/// Run one sync poll immediately, regardless of the polling flag.
#[utoipa::path(
    post,
    path = "/session/sync-check",
    tag = "session",
    responses(
        (status = 200, description = "Sync check performed", body = SessionStatusResponse)
    )
)]
pub async fn sync_check(
    State(state): State<SharedState>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let status = session_service::sync_check(&state).await?;
    Ok(Json(status))
}

/// Run the batched score refresh immediately.
#[utoipa::path(
    post,
    path = "/session/scores/refresh",
    tag = "session",
    responses(
        (status = 200, description = "Scores refreshed", body = SessionStatusResponse)
    )
)]
pub async fn refresh_scores(
    State(state): State<SharedState>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let status = session_service::refresh_scores(&state).await?;
    Ok(Json(status))
}

/// Enable or disable the poll loop.
#[utoipa::path(
    put,
    path = "/session/polling",
    tag = "session",
    request_body = PollingRequest,
    responses(
        (status = 200, description = "Polling toggled", body = SessionStatusResponse)
    )
)]
pub async fn set_polling(
    State(state): State<SharedState>,
    Json(payload): Json<PollingRequest>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let status = session_service::set_polling(&state, payload.enabled).await?;
    Ok(Json(status))
}

/// Restart polling, clearing any resource-exhaustion cool-down.
#[utoipa::path(
    post,
    path = "/session/polling/restart",
    tag = "session",
    responses(
        (status = 200, description = "Polling restarted", body = SessionStatusResponse)
    )
)]
pub async fn restart_polling(
    State(state): State<SharedState>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let status = session_service::restart_polling(&state).await?;
    Ok(Json(status))
}

/// Summary statistics over the recorded scores.
#[utoipa::path(
    get,
    path = "/session/summary",
    tag = "session",
    responses(
        (status = 200, description = "Session summary", body = SummaryResponse)
    )
)]
pub async fn session_summary(
    State(state): State<SharedState>,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = session_service::session_summary(&state).await?;
    Ok(Json(summary.into()))
}
