//! Event stream plumbing: broadcast hub → SSE response.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::{dto::events::ServerEvent, state::SharedState};

/// Subscribe to the shared session event stream.
pub fn subscribe(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.events().subscribe()
}

/// Convert a broadcast receiver into an SSE response.
///
/// Lagged observers skip the messages they missed but keep the stream; a
/// closed hub ends it. Axum drops the stream when the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(payload) => {
                    let mut event = Event::default().data(payload.data);
                    if let Some(name) = payload.event {
                        event = event.event(name);
                    }
                    yield Ok(event);
                }
                Err(RecvError::Closed) => {
                    debug!("event hub closed; ending SSE stream");
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "SSE observer lagged; skipping missed events");
                    continue;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Send a human-readable info message onto the event stream.
pub fn broadcast_info(state: &SharedState, message: &str) {
    state
        .events()
        .broadcast(ServerEvent::new(Some("info".to_string()), message.to_string()));
}
