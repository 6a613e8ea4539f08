use crate::media::RemoteTrack;
use huddle_core::{ConnectionId, IceCandidate, ParticipantId};
use std::fmt;

/// Connectivity as reported by the media transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
pub enum ConnectionEventKind {
    LocalCandidate(IceCandidate),
    StateChanged(LinkState),
    TrackAdded(RemoteTrack),
    HandshakeTimeout,
}

/// Something a media connection reported asynchronously.
///
/// Carries the connection id so events from a disposed connection can be
/// told apart from its replacement.
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    pub participant: ParticipantId,
    pub connection: ConnectionId,
    pub kind: ConnectionEventKind,
}
