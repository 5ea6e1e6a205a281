//! Live log stream over WebSocket.
//!
//! Each connection subscribes to the broadcaster, immediately receives
//! the connection acknowledgement, then every broadcast event as a JSON
//! text frame until either side closes. The subscription is removed on
//! every exit path; a connection that vanishes without a close frame is
//! also reaped by the broadcaster's next failed send.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};

use crate::AppState;

/// Upgrade `GET /ws/logs` and stream broadcast events
pub async fn logs_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_logs(state, socket))
}

async fn stream_logs(state: AppState, mut socket: WebSocket) {
    let mut subscription = state.broadcaster.subscribe();
    tracing::debug!(subscriber = %subscription.id, "log stream opened");

    loop {
        tokio::select! {
            event = subscription.rx.recv() => {
                let Some(event) = event else { break };
                let Ok(payload) = serde_json::to_string(&event) else { continue };
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Clients have nothing else to say on this stream.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.broadcaster.unsubscribe(subscription.id);
    tracing::debug!(subscriber = %subscription.id, "log stream closed");
}
