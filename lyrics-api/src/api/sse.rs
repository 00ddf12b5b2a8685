//! Server-Sent Events mirror of the notification channel
//!
//! `GET /api/events` registers an SSE client with the broadcast hub exactly
//! like a WebSocket client. Every hub message becomes one SSE `message` event
//! carrying the same JSON (or notice text). The channel is unregistered when
//! the client disconnects and the stream is dropped.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::hub::ChannelGuard;
use crate::AppState;

/// GET /api/events
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let hub = Arc::clone(state.songs.hub());
    let (channel_id, mut rx) = hub.open_channel();
    let guard = ChannelGuard::new(hub, channel_id);
    info!("SSE client {} connected", channel_id);

    let stream = async_stream::stream! {
        let _guard = guard;

        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        while let Some(message) = rx.recv().await {
            yield Ok(Event::default().data(&*message));
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
