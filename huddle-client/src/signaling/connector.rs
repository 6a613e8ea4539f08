use async_trait::async_trait;
use huddle_core::RoomId;
use tokio::sync::mpsc;

/// An open text channel to the relay.
///
/// Dropping `outbound` closes the channel from our side; `inbound` ending
/// means the relay side went away.
pub struct RawChannel {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

/// Opens relay channels scoped to one room.
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    /// Resolves only once the channel is ready to carry messages.
    async fn connect(&self, room: &RoomId) -> anyhow::Result<RawChannel>;
}
