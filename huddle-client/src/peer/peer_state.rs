use std::fmt;

/// Handshake progress of one peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerState {
    New,
    OfferSent,
    AnswerSent,
    Connected,
    Closed,
    Failed,
}

impl PeerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PeerState::Closed | PeerState::Failed)
    }

    pub fn can_transition_to(&self, next: PeerState) -> bool {
        use PeerState::*;
        match (self, next) {
            (Closed, _) => false,
            (Failed, Closed) => true,
            (Failed, _) => false,
            (_, Failed | Closed) => true,
            (New, OfferSent | AnswerSent) => true,
            (OfferSent | AnswerSent, Connected) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PeerState::New => "NEW",
            PeerState::OfferSent => "OFFER_SENT",
            PeerState::AnswerSent => "ANSWER_SENT",
            PeerState::Connected => "CONNECTED",
            PeerState::Closed => "CLOSED",
            PeerState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}
