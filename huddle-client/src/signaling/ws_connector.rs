use crate::signaling::{RawChannel, SignalingConnector};
use anyhow::Context;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::RoomId;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

/// Connects to a relay over WebSocket at `{base_url}/ws/{room}`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    base_url: String,
}

impl WsConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    pub fn room_url(&self, room: &RoomId) -> String {
        format!("{}/ws/{}", self.base_url, room)
    }
}

#[async_trait]
impl SignalingConnector for WsConnector {
    async fn connect(&self, room: &RoomId) -> anyhow::Result<RawChannel> {
        let url = self.room_url(room);
        info!("Connecting to relay: {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        let (mut write, mut read) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    error!("Failed to send WebSocket message: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
            debug!("Relay writer terminated");
        });

        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(text.as_str().to_owned()).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("Relay closed the connection");
                        break;
                    }
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            debug!("Relay reader terminated");
        });

        Ok(RawChannel {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
