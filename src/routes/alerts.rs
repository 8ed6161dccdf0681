//! Routes for the dismissible alert registry.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::alerts::AlertView, error::AppError, services::alert_service, state::SharedState,
};

/// Configure the alert routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/alerts", get(list_alerts))
        .route("/alerts/{id}", delete(dismiss_alert))
}

/// All live alerts, oldest first.
#[utoipa::path(
    get,
    path = "/alerts",
    tag = "alerts",
    responses(
        (status = 200, description = "Live alerts", body = [AlertView])
    )
)]
pub async fn list_alerts(State(state): State<SharedState>) -> Json<Vec<AlertView>> {
    Json(alert_service::list(&state))
}

/// Dismiss one alert.
#[utoipa::path(
    delete,
    path = "/alerts/{id}",
    tag = "alerts",
    params(("id" = Uuid, Path, description = "Identifier of the alert to dismiss")),
    responses(
        (status = 200, description = "Alert dismissed")
    )
)]
pub async fn dismiss_alert(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<(), AppError> {
    alert_service::dismiss(&state, id)?;
    Ok(())
}
