use crate::directory::DirectoryError;
use crate::media::DeviceError;
use huddle_core::{ParticipantId, RoomId};

pub type Result<T> = std::result::Result<T, SessionError>;

/// Failures surfaced to the presentation layer.
///
/// Peer-scoped variants carry the participant they concern; the session keeps
/// running after them. Media and transport failures end the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("local media acquisition failed: {0}")]
    MediaAcquisition(#[from] DeviceError),

    #[error("signaling transport failure: {0}")]
    Transport(String),

    #[error("handshake with {participant} failed: {reason}")]
    Handshake {
        participant: ParticipantId,
        reason: String,
    },

    #[error("connection to {participant} failed: {reason}")]
    Connection {
        participant: ParticipantId,
        reason: String,
    },

    #[error("relay reported an error: {0}")]
    Relay(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("already joined room {0}")]
    AlreadyJoined(RoomId),

    #[error("not joined to a room")]
    NotJoined,

    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),
}

impl SessionError {
    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            SessionError::Handshake { participant, .. }
            | SessionError::Connection { participant, .. }
            | SessionError::UnknownParticipant(participant) => Some(participant),
            _ => None,
        }
    }

    /// Whether this failure ends the whole room session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::MediaAcquisition(_) | SessionError::Transport(_)
        )
    }

    pub(crate) fn handshake(participant: &ParticipantId, reason: impl std::fmt::Display) -> Self {
        SessionError::Handshake {
            participant: participant.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn connection(participant: &ParticipantId, reason: impl std::fmt::Display) -> Self {
        SessionError::Connection {
            participant: participant.clone(),
            reason: reason.to_string(),
        }
    }
}
