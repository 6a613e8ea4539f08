mod participant;
mod room;
mod sdp;
mod signaling;

pub use participant::{ConnectionId, ParticipantId};
pub use room::RoomId;
pub use sdp::{IceCandidate, SdpType, SessionDescription};
pub use signaling::{
    ANSWER, DecodeError, ERROR, Envelope, ICE_CANDIDATE, JOIN_ROOM, OFFER, Presence, SignalMessage,
    USER_JOINED, USER_LEFT,
};
