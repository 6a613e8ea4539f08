use crate::error::SessionError;
use crate::media::RemoteStream;
use crate::peer::PeerState;
use huddle_core::ParticipantId;
use tokio::sync::broadcast;
use tracing::trace;

/// Notifications for the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    UserJoined {
        participant: ParticipantId,
        name: String,
    },
    UserLeft {
        participant: ParticipantId,
        name: Option<String>,
    },
    RemoteStreamAdded {
        participant: ParticipantId,
        stream: RemoteStream,
    },
    RemoteStreamRemoved {
        participant: ParticipantId,
    },
    PeerStateChanged {
        participant: ParticipantId,
        state: PeerState,
    },
    Error(SessionError),
}

/// Fan-out of session events to any number of subscribers.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Having no subscribers is not an error.
    pub fn emit(&self, event: SessionEvent) {
        trace!("Session event: {:?}", event);
        let _ = self.tx.send(event);
    }
}
