use std::sync::Arc;
use axum::{
    extract::{Path, State, ws::{Message, WebSocket, WebSocketUpgrade}},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::models::ErrorResponse;
use crate::sync::codec::Frame;
use crate::utils::scope_guard::ScopeGuard;
use super::hub::{validate_channel_name, RelayHub};

/// WebSocket relay endpoint
pub async fn relay_handler(
    Path(channel): Path<String>,
    ws: WebSocketUpgrade,
    State(hub): State<Arc<RelayHub>>,
) -> Response {
    if let Err(message) = validate_channel_name(&channel) {
        warn!("Rejected relay connection: {}", message);
        return ErrorResponse::reply(StatusCode::BAD_REQUEST, message).into_response();
    }
    info!("New relay connection attempt on channel {}", channel);
    ws.on_upgrade(move |socket| handle_socket(socket, channel, hub))
}

/// Pump frames between one socket and its hub channel
async fn handle_socket(socket: WebSocket, channel: String, hub: Arc<RelayHub>) {
    let membership = hub.join(&channel);
    let conn_id = membership.conn_id;
    info!("Relay connection {} joined channel {}", conn_id, channel);

    let _leave = ScopeGuard::new({
        let hub = hub.clone();
        let channel = channel.clone();
        move || {
            hub.leave(&channel, conn_id);
            info!("Relay connection {} left channel {}", conn_id, channel);
        }
    });

    let (mut sender, mut receiver) = socket.split();
    let bc = membership.sender;
    let mut rbc = membership.receiver;

    // Socket -> hub. Only data frames are relayed; control frames are handled by axum.
    let inbound_hub = hub.clone();
    let inbound_channel = channel.clone();
    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let frame = match msg {
                Message::Text(text) => Frame::Text(text),
                Message::Binary(bytes) => Frame::Binary(bytes),
                Message::Close(_) => break,
                _ => continue,
            };
            inbound_hub.relay(&inbound_channel, conn_id, frame, &bc);
        }
    });

    // Hub -> socket, skipping frames this connection sent
    let mut outbound = tokio::spawn(async move {
        loop {
            match rbc.recv().await {
                Ok(relayed) => {
                    if relayed.sender_id == conn_id {
                        continue;
                    }
                    let msg = match relayed.frame {
                        Frame::Text(text) => Message::Text(text),
                        Frame::Binary(bytes) => Message::Binary(bytes),
                    };
                    if sender.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Relay connection {} lagged, {} frames skipped", conn_id, skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Whichever side finishes first takes the other down. The aborted task is
    // awaited so its hub receiver is gone before the guard leaves the channel.
    let inbound_finished = tokio::select! {
        _ = &mut inbound => true,
        _ = &mut outbound => false,
    };
    if inbound_finished {
        outbound.abort();
        let _ = outbound.await;
    } else {
        inbound.abort();
        let _ = inbound.await;
    }
}
