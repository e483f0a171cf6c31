use crate::api::AppState;
use crate::relay::RelayHandle;
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use presence_core::{ClientMessage, ServerMessage, SessionId};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.relay))
}

async fn handle_socket(socket: WebSocket, relay: RelayHandle) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let session_id = match relay.connect(tx).await {
        Ok(id) => id,
        Err(e) => {
            error!("Relay unavailable, rejecting socket: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    info!("New WebSocket connection: {}", session_id);

    let mut send_task = tokio::spawn({
        let session_id = session_id.clone();

        async move {
            while let Some(msg) = rx.recv().await {
                let text = match msg.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to encode frame for {}: {}", session_id, e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();
        let session_id = session_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        if forward_frame(&relay, &session_id, text.as_str()).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    let _ = relay.disconnect(session_id.clone()).await;
    info!("WebSocket disconnected: {}", session_id);
}

/// Decodes one text frame and hands it to the relay. Malformed frames are
/// logged and skipped; only a dead relay ends the session.
async fn forward_frame(
    relay: &RelayHandle,
    session_id: &SessionId,
    text: &str,
) -> Result<(), crate::relay::RelayError> {
    let msg = match ClientMessage::decode(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Invalid frame from {}: {}", session_id, e);
            return Ok(());
        }
    };

    match msg {
        ClientMessage::Transform(transform) => {
            relay.transform(session_id.clone(), transform).await
        }
        directed => {
            let Some((to, payload)) = directed.into_directed() else {
                return Ok(());
            };
            debug!("{} -> {}: {}", session_id, to, payload.kind());
            relay.signal(session_id.clone(), to, payload).await
        }
    }
}
