use async_trait::async_trait;
use huddle_core::{IceCandidate, ParticipantId, SessionDescription};

/// Outgoing side of signaling as seen by the peer manager.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_offer(&self, target: ParticipantId, description: SessionDescription);

    async fn send_answer(&self, target: ParticipantId, description: SessionDescription);

    async fn send_ice(&self, target: ParticipantId, candidate: IceCandidate);
}
