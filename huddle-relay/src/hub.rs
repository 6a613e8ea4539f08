use dashmap::DashMap;
use huddle_core::{
    DecodeError, Envelope, JOIN_ROOM, ParticipantId, Presence, RoomId, SignalMessage,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Relay-assigned identity of one socket.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ClientId(String);

impl ClientId {
    fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(format!("client_{}", &simple[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct Membership {
    room: RoomId,
    participant: ParticipantId,
    name: String,
}

struct ClientEntry {
    tx: mpsc::Sender<String>,
    membership: Option<Membership>,
}

struct HubInner {
    clients: DashMap<ClientId, ClientEntry>,
    rooms: DashMap<RoomId, Vec<ClientId>>,
    queue_capacity: usize,
}

/// Room bookkeeping and message fan-out for the signaling relay.
#[derive(Clone)]
pub struct RelayHub {
    inner: Arc<HubInner>,
}

/// An in-process client, for running sessions against a hub without sockets.
pub struct LocalClient {
    pub id: ClientId,
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::Receiver<String>,
}

impl RelayHub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                clients: DashMap::new(),
                rooms: DashMap::new(),
                queue_capacity: queue_capacity.max(1),
            }),
        }
    }

    /// Adds a client. Messages for it arrive on the returned receiver.
    pub fn register(&self) -> (ClientId, mpsc::Receiver<String>) {
        let id = ClientId::generate();
        let (tx, rx) = mpsc::channel(self.inner.queue_capacity);
        self.inner.clients.insert(
            id.clone(),
            ClientEntry {
                tx,
                membership: None,
            },
        );
        info!("Client registered: {}", id);
        (id, rx)
    }

    /// Removes a client, telling the rest of its room. Unknown ids are ignored.
    pub fn unregister(&self, client: &ClientId) {
        let Some((_, entry)) = self.inner.clients.remove(client) else {
            return;
        };
        if let Some(membership) = entry.membership {
            self.leave_room(client, &membership);
        }
        info!("Client unregistered: {}", client);
    }

    pub fn handle_text(&self, client: &ClientId, text: &str) {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) if e.kind() == Some(JOIN_ROOM) => {
                warn!("Invalid join-room from {}: {}", client, e);
                self.send_error(client, "Invalid join room data");
                return;
            }
            Err(DecodeError::UnknownType(kind)) => {
                warn!("Unknown message type from {}: {}", client, kind);
                return;
            }
            Err(e) => {
                warn!("Dropping message from {}: {}", client, e);
                return;
            }
        };

        match envelope.message {
            SignalMessage::JoinRoom {
                room,
                participant,
                name,
            } => self.join_room(client, room, participant, name),
            message @ (SignalMessage::Offer { .. }
            | SignalMessage::Answer { .. }
            | SignalMessage::IceCandidate { .. }) => self.forward_to_target(client, message),
            other => debug!("Ignoring {} sent by client {}", other.kind(), client),
        }
    }

    pub fn client_count(&self) -> usize {
        self.inner.clients.len()
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.len()
    }

    /// Participants in a room, in join order.
    pub fn room_members(&self, room: &RoomId) -> Vec<ParticipantId> {
        self.member_ids(room)
            .iter()
            .filter_map(|id| self.membership(id))
            .map(|m| m.participant)
            .collect()
    }

    /// Registers a client fed by an in-process channel. The client is
    /// unregistered when `outbound` is dropped.
    pub fn connect_local(&self) -> LocalClient {
        let (id, inbound) = self.register();
        let (outbound, mut rx) = mpsc::unbounded_channel::<String>();

        let hub = self.clone();
        let client = id.clone();
        tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                hub.handle_text(&client, &text);
            }
            hub.unregister(&client);
        });

        LocalClient {
            id,
            outbound,
            inbound,
        }
    }

    fn join_room(&self, client: &ClientId, room: RoomId, participant: ParticipantId, name: String) {
        let previous = {
            let Some(mut entry) = self.inner.clients.get_mut(client) else {
                return;
            };
            entry.membership.replace(Membership {
                room: room.clone(),
                participant: participant.clone(),
                name: name.clone(),
            })
        };
        if let Some(previous) = previous {
            self.leave_room(client, &previous);
        }

        self.inner
            .rooms
            .entry(room.clone())
            .or_insert_with(|| {
                info!("Room {} created", room);
                Vec::new()
            })
            .push(client.clone());
        if self.discard_if_gone(client, &room) {
            debug!("Client {} disconnected while joining {}", client, room);
            return;
        }
        info!("Client {} ({}) joined room {}", participant, name, room);

        let announcement = Envelope::new(SignalMessage::UserJoined(Presence {
            participant: participant.clone(),
            name,
        }))
        .with_room(room.clone())
        .with_sender(participant);
        self.broadcast_to_others(&room, client, &announcement);
    }

    /// Undoes a room push for a client that was unregistered concurrently,
    /// whose own leave ran before the push. Returns `true` when undone.
    fn discard_if_gone(&self, client: &ClientId, room: &RoomId) -> bool {
        if self.inner.clients.contains_key(client) {
            return false;
        }
        if let Some(mut members) = self.inner.rooms.get_mut(room) {
            members.retain(|id| id != client);
        }
        self.inner.rooms.remove_if(room, |_, members| members.is_empty());
        true
    }

    fn leave_room(&self, client: &ClientId, membership: &Membership) {
        let now_empty = match self.inner.rooms.get_mut(&membership.room) {
            Some(mut members) => {
                members.retain(|id| id != client);
                members.is_empty()
            }
            None => return,
        };
        if now_empty {
            self.inner
                .rooms
                .remove_if(&membership.room, |_, members| members.is_empty());
            info!("Room {} deleted (empty)", membership.room);
            return;
        }

        info!(
            "Client {} ({}) left room {}",
            membership.participant, membership.name, membership.room
        );
        let announcement = Envelope::new(SignalMessage::UserLeft(Presence {
            participant: membership.participant.clone(),
            name: membership.name.clone(),
        }))
        .with_room(membership.room.clone())
        .with_sender(membership.participant.clone());
        self.broadcast_to_others(&membership.room, client, &announcement);
    }

    fn forward_to_target(&self, client: &ClientId, message: SignalMessage) {
        let Some(sender) = self.membership(client) else {
            warn!("Client {} not in a room", client);
            return;
        };
        let Some(target) = message.target().cloned() else {
            return;
        };

        let recipient = self
            .member_ids(&sender.room)
            .into_iter()
            .find(|id| self.membership(id).is_some_and(|m| m.participant == target));
        let Some(recipient) = recipient else {
            debug!(
                "No {} in room {} for {} from {}",
                target,
                sender.room,
                message.kind(),
                sender.participant
            );
            return;
        };

        let envelope = Envelope::new(message)
            .with_room(sender.room)
            .with_sender(sender.participant);
        self.deliver(&recipient, &envelope);
    }

    fn broadcast_to_others(&self, room: &RoomId, exclude: &ClientId, envelope: &Envelope) {
        for id in self.member_ids(room) {
            if &id != exclude {
                self.deliver(&id, envelope);
            }
        }
    }

    fn send_error(&self, client: &ClientId, error: &str) {
        self.deliver(client, &Envelope::new(SignalMessage::Error(error.to_owned())));
    }

    /// Queues an envelope for a client. A client whose queue is full is
    /// dropped.
    fn deliver(&self, client: &ClientId, envelope: &Envelope) {
        let text = match envelope.encode() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode {}: {}", envelope.message.kind(), e);
                return;
            }
        };

        let result = match self.inner.clients.get(client) {
            Some(entry) => entry.tx.try_send(text),
            None => return,
        };
        match result {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Outbound queue for {} is full, dropping client", client);
                self.unregister(client);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Client {} already gone", client);
            }
        }
    }

    fn membership(&self, client: &ClientId) -> Option<Membership> {
        self.inner
            .clients
            .get(client)
            .and_then(|entry| entry.membership.clone())
    }

    fn member_ids(&self, room: &RoomId) -> Vec<ClientId> {
        self.inner
            .rooms
            .get(room)
            .map(|members| members.clone())
            .unwrap_or_default()
    }
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new(256)
    }
}
