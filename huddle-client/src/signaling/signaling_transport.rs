use crate::signaling::{SignalingConnector, SignalingOutput, TransportEvent};
use async_trait::async_trait;
use huddle_core::{Envelope, IceCandidate, ParticipantId, RoomId, SessionDescription, SignalMessage};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct TransportInner {
    room: RoomId,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

/// The session's channel to the relay, scoped to one room.
#[derive(Clone)]
pub struct SignalingTransport {
    inner: Arc<TransportInner>,
}

impl SignalingTransport {
    /// Connects and starts decoding incoming messages into `events`.
    ///
    /// Messages that fail to decode are delivered as `error` messages.
    /// `TransportEvent::Closed` is sent once if the relay side goes away.
    pub async fn open(
        connector: &dyn SignalingConnector,
        room: RoomId,
        events: mpsc::Sender<TransportEvent>,
    ) -> anyhow::Result<Self> {
        let channel = connector.connect(&room).await?;
        let mut inbound = channel.inbound;

        let reader_room = room.clone();
        let reader = tokio::spawn(async move {
            while let Some(text) = inbound.recv().await {
                let envelope = match Envelope::decode(&text) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("Undecodable message in room {}: {}", reader_room, e);
                        Envelope::new(SignalMessage::Error(format!("undecodable message: {e}")))
                    }
                };
                if events.send(TransportEvent::Message(envelope)).await.is_err() {
                    return;
                }
            }
            debug!("Relay channel for room {} ended", reader_room);
            let _ = events.send(TransportEvent::Closed).await;
        });

        Ok(Self {
            inner: Arc::new(TransportInner {
                room,
                outbound: Mutex::new(Some(channel.outbound)),
                reader: Mutex::new(Some(reader)),
            }),
        })
    }

    pub fn room(&self) -> &RoomId {
        &self.inner.room
    }

    /// Queues a message for the relay. Dropped silently when closed.
    pub async fn send(&self, envelope: Envelope) {
        let outbound = self.inner.outbound.lock().await;
        let Some(tx) = outbound.as_ref() else {
            debug!("Dropping {} on closed transport", envelope.message.kind());
            return;
        };
        match envelope.encode() {
            Ok(text) => {
                let _ = tx.send(text);
            }
            Err(e) => warn!("Failed to encode {}: {}", envelope.message.kind(), e),
        }
    }

    pub async fn is_open(&self) -> bool {
        self.inner
            .outbound
            .lock()
            .await
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Closes the channel. Later calls do nothing.
    pub async fn close(&self) {
        if self.inner.outbound.lock().await.take().is_some() {
            debug!("Closed relay channel for room {}", self.inner.room);
        }
        if let Some(reader) = self.inner.reader.lock().await.take() {
            reader.abort();
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingTransport {
    async fn send_offer(&self, target: ParticipantId, description: SessionDescription) {
        self.send(Envelope::new(SignalMessage::Offer {
            target,
            description,
        }))
        .await;
    }

    async fn send_answer(&self, target: ParticipantId, description: SessionDescription) {
        self.send(Envelope::new(SignalMessage::Answer {
            target,
            description,
        }))
        .await;
    }

    async fn send_ice(&self, target: ParticipantId, candidate: IceCandidate) {
        self.send(Envelope::new(SignalMessage::IceCandidate { target, candidate }))
            .await;
    }
}
