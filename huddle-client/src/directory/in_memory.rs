use crate::directory::{DirectoryError, Meeting, MeetingDirectory};
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{ParticipantId, RoomId};
use std::sync::Arc;
use tracing::info;

/// Process-local directory. Handles created with `for_user` share one store.
#[derive(Clone)]
pub struct InMemoryDirectory {
    user: ParticipantId,
    meetings: Arc<DashMap<RoomId, Meeting>>,
}

impl InMemoryDirectory {
    pub fn new(user: impl Into<ParticipantId>) -> Self {
        Self {
            user: user.into(),
            meetings: Arc::new(DashMap::new()),
        }
    }

    /// Another user's view of the same store.
    pub fn for_user(&self, user: impl Into<ParticipantId>) -> Self {
        Self {
            user: user.into(),
            meetings: Arc::clone(&self.meetings),
        }
    }

    pub fn user(&self) -> &ParticipantId {
        &self.user
    }
}

#[async_trait]
impl MeetingDirectory for InMemoryDirectory {
    async fn create(&self, title: &str, description: &str) -> Result<Meeting, DirectoryError> {
        let mut room_id = RoomId::generate();
        while self.meetings.contains_key(&room_id) {
            room_id = RoomId::generate();
        }

        let meeting = Meeting {
            room_id: room_id.clone(),
            title: title.to_owned(),
            description: description.to_owned(),
            created_by: self.user.clone(),
            is_active: true,
            participants: vec![self.user.clone()],
        };
        self.meetings.insert(room_id, meeting.clone());
        info!("Meeting {} created by {}", meeting.room_id, self.user);
        Ok(meeting)
    }

    async fn join(&self, room: &RoomId) -> Result<Meeting, DirectoryError> {
        let mut meeting = self
            .meetings
            .get_mut(room)
            .ok_or_else(|| DirectoryError::NotFound(room.clone()))?;
        if !meeting.is_active {
            return Err(DirectoryError::Ended(room.clone()));
        }
        if !meeting.participants.contains(&self.user) {
            meeting.participants.push(self.user.clone());
        }
        Ok(meeting.clone())
    }

    async fn end(&self, room: &RoomId) -> Result<(), DirectoryError> {
        let mut meeting = self
            .meetings
            .get_mut(room)
            .ok_or_else(|| DirectoryError::NotFound(room.clone()))?;
        if meeting.created_by != self.user {
            return Err(DirectoryError::Unauthorized(
                "only the meeting creator can end the meeting".to_owned(),
            ));
        }
        meeting.is_active = false;
        info!("Meeting {} ended by {}", room, self.user);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Meeting>, DirectoryError> {
        let mut meetings: Vec<Meeting> = self
            .meetings
            .iter()
            .filter(|m| m.created_by == self.user || m.participants.contains(&self.user))
            .map(|m| m.value().clone())
            .collect();
        meetings.sort_by(|a, b| a.room_id.as_str().cmp(b.room_id.as_str()));
        Ok(meetings)
    }
}
