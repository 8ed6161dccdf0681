//! Dismissible operator alerts.
//!
//! Failures in the sync loops never stop the service; they surface here so
//! the operator UI can show a banner with a dismiss action and retry hints.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dto::{
        alerts::AlertView,
        events::{AlertRaisedEvent, ServerEvent},
    },
    error::ServiceError,
    state::{Alert, AlertKind, SharedState},
};

/// Raise a new alert and announce it on the event stream.
pub fn raise(state: &SharedState, kind: AlertKind, message: impl Into<String>) -> Alert {
    let alert = Alert {
        id: Uuid::new_v4(),
        kind,
        message: message.into(),
        raised_at: SystemTime::now(),
    };
    state.alerts().insert(alert.id, alert.clone());

    if let Ok(event) = ServerEvent::json(
        Some("alert".to_string()),
        &AlertRaisedEvent {
            alert: alert.clone().into(),
        },
    ) {
        state.events().broadcast(event);
    }

    alert
}

/// Replace any existing alert of the given kind with a fresh one.
///
/// Used by the connection monitor so a flapping engine produces one live
/// banner, not a pile of thirty-second-old duplicates.
pub fn replace(state: &SharedState, kind: AlertKind, message: impl Into<String>) -> Alert {
    clear_kind(state, kind);
    raise(state, kind, message)
}

/// Drop every alert of the given kind (e.g. connection restored).
pub fn clear_kind(state: &SharedState, kind: AlertKind) {
    state.alerts().retain(|_, alert| alert.kind != kind);
}

/// All live alerts, oldest first.
pub fn list(state: &SharedState) -> Vec<AlertView> {
    let mut alerts: Vec<Alert> = state
        .alerts()
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    alerts.sort_by_key(|alert| alert.raised_at);
    alerts.into_iter().map(Into::into).collect()
}

/// Dismiss one alert by id.
pub fn dismiss(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    state
        .alerts()
        .remove(&id)
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound(format!("alert `{id}` not found")))
}
