use crate::error::SessionError;
use crate::peer::{ParticipantInfo, PeerState};
use huddle_core::ParticipantId;
use tokio::sync::oneshot;

/// Requests from the session handle to the session actor.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    /// Close every connection and stop. `done` fires after teardown.
    Leave { done: oneshot::Sender<()> },

    RetryPeer {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    DropPeer {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    PeerCount { reply: oneshot::Sender<usize> },

    PeerState {
        participant: ParticipantId,
        reply: oneshot::Sender<Option<PeerState>>,
    },

    Participants { reply: oneshot::Sender<Vec<ParticipantInfo>> },
}
