use crate::media::LocalTrack;
use crate::transport::ConnectionEvent;
use async_trait::async_trait;
use huddle_core::{ConnectionId, IceCandidate, ParticipantId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One media connection to one remote participant.
#[async_trait]
pub trait MediaConnection: Send + Sync {
    async fn add_track(&self, track: Arc<LocalTrack>) -> anyhow::Result<()>;
    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;
    async fn create_answer(&self) -> anyhow::Result<SessionDescription>;
    async fn set_local_description(&self, description: &SessionDescription) -> anyhow::Result<()>;
    async fn set_remote_description(&self, description: &SessionDescription) -> anyhow::Result<()>;
    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> anyhow::Result<()>;
    async fn close(&self) -> anyhow::Result<()>;
}

/// Builds media connections. Implementations push everything the connection
/// reports later into `events`.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create(
        &self,
        participant: ParticipantId,
        connection: ConnectionId,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> anyhow::Result<Box<dyn MediaConnection>>;
}
