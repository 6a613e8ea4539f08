pub mod model;

pub use model::{
    ANSWER, ConnectionId, DecodeError, ERROR, Envelope, ICE_CANDIDATE, IceCandidate, JOIN_ROOM,
    OFFER, ParticipantId, Presence, RoomId, SdpType, SessionDescription, SignalMessage,
    USER_JOINED, USER_LEFT,
};
