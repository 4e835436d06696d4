//! WebSocket transport: one session per connection, one reply per message.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use tracing::Instrument;
use uuid::Uuid;

use crate::protocol::{Control, Dispatcher, SessionPolicy, SessionState};
use crate::types::McpError;

/// Drive a single WebSocket connection until the client leaves, the
/// connection idles out, or an unrecoverable frame arrives.
pub async fn run_connection(
    socket: WebSocket,
    dispatcher: Dispatcher,
    policy: SessionPolicy,
    state: SessionState,
    idle_timeout: Duration,
) {
    let connection_id = Uuid::new_v4();
    let span = tracing::info_span!("ws", %connection_id);
    session_loop(socket, dispatcher, policy, state, idle_timeout)
        .instrument(span)
        .await
}

async fn session_loop(
    mut socket: WebSocket,
    dispatcher: Dispatcher,
    policy: SessionPolicy,
    mut state: SessionState,
    idle_timeout: Duration,
) {
    tracing::debug!("WebSocket session started");

    loop {
        let next = match tokio::time::timeout(idle_timeout, socket.recv()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::info!("Idle for {idle_timeout:?}, closing connection");
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                tracing::warn!("Receive error: {e}");
                send_internal_error(&mut socket, format!("Failed to receive message: {e}")).await;
                break;
            }
            None => break,
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Binary frame is not UTF-8: {e}");
                    send_internal_error(&mut socket, "Message is not valid UTF-8".to_string())
                        .await;
                    break;
                }
            },
            Message::Close(_) => {
                tracing::debug!("Received close frame");
                break;
            }
            // Ping/pong are answered by axum.
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let dispatch = dispatcher.handle_text(&mut state, &text, &policy);
        if dispatch.control == Control::Shutdown {
            tracing::info!("Shutdown over WebSocket; session reset");
        }

        let payload = match serde_json::to_string(&dispatch.response) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to encode response: {e}");
                send_internal_error(&mut socket, e.to_string()).await;
                break;
            }
        };

        if socket.send(Message::Text(payload)).await.is_err() {
            tracing::debug!("Send failed, client gone");
            break;
        }
    }

    tracing::debug!("WebSocket session ended");
}

/// Best effort: the peer may already be gone.
async fn send_internal_error(socket: &mut WebSocket, detail: String) {
    let response = McpError::InternalError(detail).to_response(None);
    if let Ok(payload) = serde_json::to_string(&response) {
        let _ = socket.send(Message::Text(payload)).await;
    }
}
