//! Payloads for the dismissible alert registry.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    state::{Alert, AlertKind},
};

/// One dismissible alert as returned by `GET /alerts`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertView {
    /// Identifier used with `DELETE /alerts/{id}`.
    pub id: Uuid,
    /// What failed (`connection`, `sync`, `start_signal`, `scores`, `roster`).
    pub kind: String,
    /// Operator-facing description.
    pub message: String,
    /// RFC 3339 timestamp of when the alert was raised.
    pub raised_at: String,
}

impl From<Alert> for AlertView {
    fn from(alert: Alert) -> Self {
        let kind = match alert.kind {
            AlertKind::Connection => "connection",
            AlertKind::Sync => "sync",
            AlertKind::StartSignal => "start_signal",
            AlertKind::Scores => "scores",
            AlertKind::Roster => "roster",
        };

        Self {
            id: alert.id,
            kind: kind.to_string(),
            message: alert.message,
            raised_at: format_system_time(alert.raised_at),
        }
    }
}
