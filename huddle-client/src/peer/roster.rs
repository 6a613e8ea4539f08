use crate::peer::PeerConnection;
use huddle_core::ParticipantId;
use std::collections::HashMap;

/// A remote member of the room as far as this session knows.
pub struct Participant {
    pub id: ParticipantId,
    /// Unknown until a `user-joined` names the participant.
    pub name: Option<String>,
    connection: Option<PeerConnection>,
}

/// Remote participants keyed by id, each holding at most one connection.
#[derive(Default)]
pub struct Roster {
    participants: HashMap<ParticipantId, Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the participant or refreshes its name. Returns `true` if it was
    /// not known before.
    pub fn upsert(&mut self, id: &ParticipantId, name: Option<String>) -> bool {
        match self.participants.get_mut(id) {
            Some(existing) => {
                if name.is_some() {
                    existing.name = name;
                }
                false
            }
            None => {
                self.participants.insert(
                    id.clone(),
                    Participant {
                        id: id.clone(),
                        name,
                        connection: None,
                    },
                );
                true
            }
        }
    }

    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn name(&self, id: &ParticipantId) -> Option<&str> {
        self.participants.get(id).and_then(|p| p.name.as_deref())
    }

    pub fn connection(&self, id: &ParticipantId) -> Option<&PeerConnection> {
        self.participants.get(id).and_then(|p| p.connection.as_ref())
    }

    pub fn connection_mut(&mut self, id: &ParticipantId) -> Option<&mut PeerConnection> {
        self.participants
            .get_mut(id)
            .and_then(|p| p.connection.as_mut())
    }

    /// Stores a connection for a known participant. Hands the connection back
    /// if the participant is unknown or already has one.
    pub fn insert_connection(&mut self, connection: PeerConnection) -> Result<(), PeerConnection> {
        match self.participants.get_mut(connection.participant()) {
            Some(participant) if participant.connection.is_none() => {
                participant.connection = Some(connection);
                Ok(())
            }
            _ => Err(connection),
        }
    }

    pub fn take_connection(&mut self, id: &ParticipantId) -> Option<PeerConnection> {
        self.participants
            .get_mut(id)
            .and_then(|p| p.connection.take())
    }

    pub fn connection_count(&self) -> usize {
        self.participants
            .values()
            .filter(|p| p.connection.is_some())
            .count()
    }

    pub fn ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<_> = self.participants.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn drain(&mut self) -> Vec<Participant> {
        self.participants.drain().map(|(_, p)| p).collect()
    }
}

impl Participant {
    pub(crate) fn take_connection(&mut self) -> Option<PeerConnection> {
        self.connection.take()
    }
}
