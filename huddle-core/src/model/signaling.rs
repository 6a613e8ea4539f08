use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use crate::model::sdp::{IceCandidate, SdpType, SessionDescription};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JOIN_ROOM: &str = "join-room";
pub const USER_JOINED: &str = "user-joined";
pub const USER_LEFT: &str = "user-left";
pub const OFFER: &str = "offer";
pub const ANSWER: &str = "answer";
pub const ICE_CANDIDATE: &str = "ice-candidate";
pub const ERROR: &str = "error";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed signaling envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown signaling message type '{0}'")]
    UnknownType(String),

    #[error("'{0}' message carries no data")]
    MissingData(&'static str),

    #[error("invalid '{kind}' payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        source: serde_json::Error,
    },

    #[error("'{kind}' message carries a description of type '{found}'")]
    DescriptionMismatch { kind: &'static str, found: SdpType },
}

impl DecodeError {
    /// Message type whose payload was rejected, when the type was known.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            DecodeError::MissingData(kind)
            | DecodeError::InvalidPayload { kind, .. }
            | DecodeError::DescriptionMismatch { kind, .. } => Some(*kind),
            DecodeError::Json(_) | DecodeError::UnknownType(_) => None,
        }
    }
}

/// Someone entering or leaving a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Presence {
    #[serde(rename = "user_id")]
    pub participant: ParticipantId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    JoinRoom {
        room: RoomId,
        participant: ParticipantId,
        name: String,
    },
    UserJoined(Presence),
    UserLeft(Presence),
    Offer {
        target: ParticipantId,
        description: SessionDescription,
    },
    Answer {
        target: ParticipantId,
        description: SessionDescription,
    },
    IceCandidate {
        target: ParticipantId,
        candidate: IceCandidate,
    },
    Error(String),
}

impl SignalMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::JoinRoom { .. } => JOIN_ROOM,
            SignalMessage::UserJoined(_) => USER_JOINED,
            SignalMessage::UserLeft(_) => USER_LEFT,
            SignalMessage::Offer { .. } => OFFER,
            SignalMessage::Answer { .. } => ANSWER,
            SignalMessage::IceCandidate { .. } => ICE_CANDIDATE,
            SignalMessage::Error(_) => ERROR,
        }
    }

    /// Recipient of a peer-to-peer message, if it is one.
    pub fn target(&self) -> Option<&ParticipantId> {
        match self {
            SignalMessage::Offer { target, .. }
            | SignalMessage::Answer { target, .. }
            | SignalMessage::IceCandidate { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// A signaling message plus the routing fields the relay stamps on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub room: Option<RoomId>,
    pub sender: Option<ParticipantId>,
    pub message: SignalMessage,
}

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JoinRoomData {
    room_id: RoomId,
    user_id: ParticipantId,
    name: String,
}

#[derive(Serialize, Deserialize)]
struct DescriptionData {
    sdp: String,
    #[serde(rename = "type")]
    sdp_type: SdpType,
    target: ParticipantId,
}

#[derive(Serialize, Deserialize)]
struct CandidateData {
    candidate: String,
    #[serde(rename = "sdpMid", default)]
    sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex", default)]
    sdp_m_line_index: Option<u16>,
    target: ParticipantId,
}

#[derive(Deserialize)]
struct ErrorData {
    error: String,
}

impl Envelope {
    pub fn new(message: SignalMessage) -> Self {
        Self {
            room: None,
            sender: None,
            message,
        }
    }

    pub fn with_sender(mut self, sender: ParticipantId) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let mut wire = WireEnvelope {
            kind: self.message.kind().to_owned(),
            room_id: self.room.as_ref().map(|r| r.0.clone()),
            user_id: self.sender.as_ref().map(|p| p.0.clone()),
            data: None,
            error: None,
        };

        match &self.message {
            SignalMessage::JoinRoom {
                room,
                participant,
                name,
            } => {
                wire.data = Some(serde_json::to_value(JoinRoomData {
                    room_id: room.clone(),
                    user_id: participant.clone(),
                    name: name.clone(),
                })?);
            }
            SignalMessage::UserJoined(presence) | SignalMessage::UserLeft(presence) => {
                wire.data = Some(serde_json::to_value(presence)?);
            }
            SignalMessage::Offer {
                target,
                description,
            }
            | SignalMessage::Answer {
                target,
                description,
            } => {
                wire.data = Some(serde_json::to_value(DescriptionData {
                    sdp: description.sdp.clone(),
                    sdp_type: description.sdp_type,
                    target: target.clone(),
                })?);
            }
            SignalMessage::IceCandidate { target, candidate } => {
                wire.data = Some(serde_json::to_value(CandidateData {
                    candidate: candidate.candidate.clone(),
                    sdp_mid: candidate.sdp_mid.clone(),
                    sdp_m_line_index: candidate.sdp_m_line_index,
                    target: target.clone(),
                })?);
            }
            SignalMessage::Error(error) => {
                wire.error = Some(error.clone());
            }
        }

        serde_json::to_string(&wire)
    }

    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let wire: WireEnvelope = serde_json::from_str(text)?;

        let message = match wire.kind.as_str() {
            JOIN_ROOM => {
                let data: JoinRoomData = payload(JOIN_ROOM, wire.data)?;
                SignalMessage::JoinRoom {
                    room: data.room_id,
                    participant: data.user_id,
                    name: data.name,
                }
            }
            USER_JOINED => SignalMessage::UserJoined(payload(USER_JOINED, wire.data)?),
            USER_LEFT => SignalMessage::UserLeft(payload(USER_LEFT, wire.data)?),
            OFFER => {
                let data: DescriptionData = payload(OFFER, wire.data)?;
                if data.sdp_type != SdpType::Offer {
                    return Err(DecodeError::DescriptionMismatch {
                        kind: OFFER,
                        found: data.sdp_type,
                    });
                }
                SignalMessage::Offer {
                    target: data.target,
                    description: SessionDescription::offer(data.sdp),
                }
            }
            ANSWER => {
                let data: DescriptionData = payload(ANSWER, wire.data)?;
                if data.sdp_type != SdpType::Answer {
                    return Err(DecodeError::DescriptionMismatch {
                        kind: ANSWER,
                        found: data.sdp_type,
                    });
                }
                SignalMessage::Answer {
                    target: data.target,
                    description: SessionDescription::answer(data.sdp),
                }
            }
            ICE_CANDIDATE => {
                let data: CandidateData = payload(ICE_CANDIDATE, wire.data)?;
                SignalMessage::IceCandidate {
                    target: data.target,
                    candidate: IceCandidate {
                        candidate: data.candidate,
                        sdp_mid: data.sdp_mid,
                        sdp_m_line_index: data.sdp_m_line_index,
                    },
                }
            }
            ERROR => match wire.error {
                Some(error) => SignalMessage::Error(error),
                None => {
                    let data: ErrorData = payload(ERROR, wire.data)?;
                    SignalMessage::Error(data.error)
                }
            },
            other => return Err(DecodeError::UnknownType(other.to_owned())),
        };

        Ok(Self {
            room: wire.room_id.map(RoomId),
            sender: wire.user_id.map(ParticipantId),
            message,
        })
    }
}

fn payload<T: DeserializeOwned>(kind: &'static str, data: Option<Value>) -> Result<T, DecodeError> {
    let data = data.ok_or(DecodeError::MissingData(kind))?;
    serde_json::from_value(data).map_err(|source| DecodeError::InvalidPayload { kind, source })
}
