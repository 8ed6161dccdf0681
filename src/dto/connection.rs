//! Payloads for the connection monitor endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{session::ModeView, validation::validate_engine_url},
    state::ConnectionStatus,
};

/// Serialized engine reachability status.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionView {
    /// Last probe succeeded.
    Connected,
    /// Probe in progress or not yet run.
    Connecting,
    /// Last probe failed.
    Disconnected,
}

impl From<ConnectionStatus> for ConnectionView {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Connected => ConnectionView::Connected,
            ConnectionStatus::Connecting => ConnectionView::Connecting,
            ConnectionStatus::Disconnected => ConnectionView::Disconnected,
        }
    }
}

/// Connection status returned by `GET /connection` and `POST /connection/check`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectionResponse {
    /// Current reachability status.
    pub status: ConnectionView,
    /// Consecutive failed probes since the last success.
    pub retry_count: u32,
    /// Where the engine client points.
    pub engine_endpoint: String,
}

/// Payload overriding the engine base URL at runtime.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EngineUrlRequest {
    /// New base URL, e.g. `http://192.168.1.20:8000`.
    pub base_url: String,
}

impl Validate for EngineUrlRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = validate_engine_url(&self.base_url) {
            errors.add("base_url", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload switching between the live engine and the offline mock.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ModeRequest {
    /// Desired engine mode.
    pub mode: ModeView,
}
