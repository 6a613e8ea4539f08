use crate::{RelayConfig, RelayHub};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct RelayState {
    pub hub: RelayHub,
    pub config: Arc<RelayConfig>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<RelayState>,
) -> Response {
    upgrade(ws, &headers, state, None)
}

/// Same as `ws_handler`; the room in the path is informational, the room is
/// taken from `join-room`.
pub async fn ws_room_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Path(room_id): Path<String>,
    State(state): State<RelayState>,
) -> Response {
    upgrade(ws, &headers, state, Some(room_id))
}

fn upgrade(
    ws: WebSocketUpgrade,
    headers: &HeaderMap,
    state: RelayState,
    room_hint: Option<String>,
) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());
    if !state.config.origin_allowed(origin) {
        warn!("Rejected WebSocket from origin {:?}", origin);
        return StatusCode::FORBIDDEN.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state.hub, room_hint))
}

async fn handle_socket(socket: WebSocket, hub: RelayHub, room_hint: Option<String>) {
    let (client, mut rx) = hub.register();
    info!("New WebSocket connection: {} (path room {:?})", client, room_hint);

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn({
        let hub = hub.clone();
        let client = client.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => hub.handle_text(&client, text.as_str()),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            debug!("Reader for {} finished", client);
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    hub.unregister(&client);
    info!("WebSocket disconnected: {}", client);
}
