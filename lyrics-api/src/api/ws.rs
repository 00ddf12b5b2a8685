//! WebSocket notification channel
//!
//! `GET /ws` upgrades to a WebSocket registered with the broadcast hub. The
//! server pushes song events as text frames. Frames from the client are read
//! and discarded; they only keep the connection alive. When the client goes
//! away the channel is unregistered and the remaining clients get a plain
//! text notice.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use crate::hub::BroadcastHub;
use crate::AppState;

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let hub = Arc::clone(state.songs.hub());
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<BroadcastHub>) {
    let (channel_id, mut rx) = hub.open_channel();
    info!("WebSocket client {} connected", channel_id);

    let (mut sink, mut stream) = socket.split();

    // Hub queue -> socket
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(Message::Text(message.to_string())).await.is_err() {
                break;
            }
        }
    });

    // Socket -> discard, until close or error
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => debug!("Discarding inbound frame"),
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unregister(channel_id);
    info!("WebSocket client {} disconnected", channel_id);
    hub.broadcast_text(&format!("Client {} disconnected", channel_id))
        .await;
}
