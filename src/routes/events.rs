//! SSE route streaming session events to observers.

use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::stream, state::SharedState};

#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    responses((status = 200, description = "Session event stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime session events to connected observers.
pub async fn event_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = stream::subscribe(&state);
    info!("new SSE observer connected");
    stream::broadcast_info(&state, "event stream connected");
    stream::to_sse_stream(receiver)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/events", get(event_stream))
}
