//! Health view of the service and its engine.

use tracing::warn;

use crate::{dto::health::HealthResponse, engine::GameEngine, state::SharedState};

/// Probe the engine and report `ok` or `degraded` accordingly.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let engine = state.engine().await;
    match engine.probe().await {
        Ok(()) => HealthResponse::ok(),
        Err(err) => {
            warn!(error = %err, "engine health probe failed");
            HealthResponse::degraded()
        }
    }
}
