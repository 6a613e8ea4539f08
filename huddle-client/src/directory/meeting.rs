use async_trait::async_trait;
use huddle_core::{ParticipantId, RoomId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("meeting {0} not found")]
    NotFound(RoomId),

    #[error("meeting {0} has ended")]
    Ended(RoomId),

    #[error("not allowed: {0}")]
    Unauthorized(String),
}

/// Metadata kept by the meeting directory for one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub room_id: RoomId,
    pub title: String,
    pub description: String,
    pub created_by: ParticipantId,
    pub is_active: bool,
    pub participants: Vec<ParticipantId>,
}

/// Meeting bookkeeping as seen by one signed-in user.
#[async_trait]
pub trait MeetingDirectory: Send + Sync {
    async fn create(&self, title: &str, description: &str) -> Result<Meeting, DirectoryError>;

    /// Validates that the room exists and is still running.
    async fn join(&self, room: &RoomId) -> Result<Meeting, DirectoryError>;

    /// Only the creator may end a meeting.
    async fn end(&self, room: &RoomId) -> Result<(), DirectoryError>;

    async fn list(&self) -> Result<Vec<Meeting>, DirectoryError>;
}
