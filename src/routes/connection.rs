//! Routes exposing the connection monitor and its overrides.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        connection::{ConnectionResponse, EngineUrlRequest, ModeRequest},
        session::{ModeView, PhaseView},
    },
    error::AppError,
    services::{connection, session_service},
    state::{EngineMode, SharedState},
};

/// Configure the connection routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/connection", get(connection_status))
        .route("/connection/check", post(check_connection))
        .route("/connection/engine", put(set_engine_url))
        .route("/connection/mode", put(set_mode))
}

async fn build_response(state: &SharedState) -> ConnectionResponse {
    ConnectionResponse {
        status: state.connection_status().into(),
        retry_count: state.probe_failures(),
        engine_endpoint: state.engine().await.endpoint(),
    }
}

/// Current engine reachability as seen by the monitor.
#[utoipa::path(
    get,
    path = "/connection",
    tag = "connection",
    responses(
        (status = 200, description = "Connection status", body = ConnectionResponse)
    )
)]
pub async fn connection_status(State(state): State<SharedState>) -> Json<ConnectionResponse> {
    Json(build_response(&state).await)
}

/// Probe the engine immediately.
#[utoipa::path(
    post,
    path = "/connection/check",
    tag = "connection",
    responses(
        (status = 200, description = "Probe performed", body = ConnectionResponse)
    )
)]
pub async fn check_connection(State(state): State<SharedState>) -> Json<ConnectionResponse> {
    connection::check(&state).await;
    Json(build_response(&state).await)
}

/// Override the engine base URL at runtime.
#[utoipa::path(
    put,
    path = "/connection/engine",
    tag = "connection",
    request_body = EngineUrlRequest,
    responses(
        (status = 200, description = "Engine URL overridden", body = ConnectionResponse)
    )
)]
pub async fn set_engine_url(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<EngineUrlRequest>>,
) -> Result<Json<ConnectionResponse>, AppError> {
    session_service::set_engine_url(&state, payload.base_url.trim()).await?;
    Ok(Json(build_response(&state).await))
}

/// Switch between the live engine and the offline mock.
#[utoipa::path(
    put,
    path = "/connection/mode",
    tag = "connection",
    request_body = ModeRequest,
    responses(
        (status = 200, description = "Engine mode switched", body = PhaseView)
    )
)]
pub async fn set_mode(
    State(state): State<SharedState>,
    Json(payload): Json<ModeRequest>,
) -> Result<Json<PhaseView>, AppError> {
    let mode = match payload.mode {
        ModeView::Live => EngineMode::Live,
        ModeView::Mock => EngineMode::Mock,
    };
    let phase = session_service::set_mode(&state, mode).await?;
    Ok(Json(phase.into()))
}
