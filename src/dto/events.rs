//! Event payloads dispatched over the `/events` SSE stream.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{
        alerts::AlertView,
        connection::ConnectionView,
        session::{PhaseView, SummaryResponse},
    },
    engine::models::{GameId, StudentId},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Plain-text event without a serialized payload.
    pub fn new<E>(event: E, data: String) -> Self
    where
        E: Into<Option<String>>,
    {
        Self {
            event: event.into(),
            data,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted when a session begins and the loops start.
pub struct SessionBegunEvent {
    /// Game being played.
    pub game_id: GameId,
    /// Roster size after filtering and deduplication.
    pub roster_size: usize,
    /// Student playing first.
    pub first_student: StudentId,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted when a completion is recorded for a student.
pub struct CompletionEvent {
    /// Student who finished.
    pub student_id: StudentId,
    /// Their final score.
    pub score: u16,
    /// Completed count after recording.
    pub completed_count: usize,
    /// Roster size.
    pub roster_size: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted when the turn pointer moves to a new student.
pub struct TurnAdvancedEvent {
    /// Student whose turn begins.
    pub student_id: StudentId,
    /// Their roster position.
    pub position: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted after the batched score refresh replaced the completion map.
pub struct ScoresRefreshedEvent {
    /// Completed count after the refresh.
    pub completed_count: usize,
    /// Roster size.
    pub roster_size: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted once when the roster is exhausted and the loops stop.
pub struct SessionCompletedEvent {
    /// Final summary of the session.
    pub summary: SummaryResponse,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted whenever the connection monitor publishes a status change.
pub struct ConnectionChangedEvent {
    /// New reachability status.
    pub status: ConnectionView,
    /// Consecutive failed probes since the last success.
    pub retry_count: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted whenever the session phase machine transitions.
pub struct PhaseChangedEvent(pub PhaseView);

#[derive(Debug, Serialize, ToSchema)]
/// Emitted when a new alert is raised.
pub struct AlertRaisedEvent {
    /// The alert in question.
    pub alert: AlertView,
}
