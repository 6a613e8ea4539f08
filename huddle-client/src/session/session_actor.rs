use crate::error::SessionError;
use crate::media::MediaCaptureManager;
use crate::peer::PeerManager;
use crate::session::{EventEmitter, SessionCommand, SessionEvent};
use crate::signaling::{SignalingTransport, TransportEvent};
use crate::transport::ConnectionEvent;
use huddle_core::{Envelope, ParticipantId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The single task that owns one room membership.
pub(crate) struct SessionActor {
    peers: PeerManager,
    transport: SignalingTransport,
    media: Arc<MediaCaptureManager>,
    events: EventEmitter,
    command_rx: mpsc::Receiver<SessionCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    connection_rx: mpsc::Receiver<ConnectionEvent>,
}

impl SessionActor {
    pub(crate) fn new(
        peers: PeerManager,
        transport: SignalingTransport,
        media: Arc<MediaCaptureManager>,
        events: EventEmitter,
        command_rx: mpsc::Receiver<SessionCommand>,
        transport_rx: mpsc::Receiver<TransportEvent>,
        connection_rx: mpsc::Receiver<ConnectionEvent>,
    ) -> Self {
        Self {
            peers,
            transport,
            media,
            events,
            command_rx,
            transport_rx,
            connection_rx,
        }
    }

    pub(crate) async fn run(mut self) {
        info!("Session loop for room {} started", self.transport.room());

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if !self.handle_command(c).await {
                                break;
                            }
                        }
                        None => {
                            info!("Session handle dropped. Leaving room {}", self.transport.room());
                            self.teardown().await;
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    match evt {
                        Some(TransportEvent::Message(envelope)) => self.handle_signal(envelope).await,
                        Some(TransportEvent::Closed) | None => {
                            warn!("Relay connection for room {} lost", self.transport.room());
                            self.teardown().await;
                            self.media.release().await;
                            self.events.emit(SessionEvent::Error(SessionError::Transport(
                                "relay connection lost".to_owned(),
                            )));
                            break;
                        }
                    }
                }

                Some(event) = self.connection_rx.recv() => {
                    self.peers.handle_connection_event(event).await;
                }
            }
        }

        info!("Session loop for room {} finished", self.transport.room());
    }

    /// Returns `false` once the session should stop.
    async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Leave { done } => {
                self.teardown().await;
                let _ = done.send(());
                return false;
            }
            SessionCommand::RetryPeer { participant, reply } => {
                let _ = reply.send(self.peers.retry(&participant).await);
            }
            SessionCommand::DropPeer { participant, reply } => {
                let _ = reply.send(self.peers.drop_peer(&participant).await);
            }
            SessionCommand::PeerCount { reply } => {
                let _ = reply.send(self.peers.peer_count());
            }
            SessionCommand::PeerState { participant, reply } => {
                let _ = reply.send(self.peers.peer_state(&participant));
            }
            SessionCommand::Participants { reply } => {
                let _ = reply.send(self.peers.participants());
            }
        }
        true
    }

    async fn handle_signal(&mut self, envelope: Envelope) {
        let Envelope {
            sender, message, ..
        } = envelope;

        match message {
            SignalMessage::UserJoined(presence) => {
                self.peers
                    .handle_peer_joined(presence.participant, presence.name)
                    .await;
            }
            SignalMessage::UserLeft(presence) => {
                self.peers.handle_peer_left(presence.participant).await;
            }
            SignalMessage::Offer {
                target,
                description,
            } => {
                if let Some(from) = self.routed_sender(sender, &target, "offer") {
                    self.peers.handle_offer(from, description).await;
                }
            }
            SignalMessage::Answer {
                target,
                description,
            } => {
                if let Some(from) = self.routed_sender(sender, &target, "answer") {
                    self.peers.handle_answer(from, description).await;
                }
            }
            SignalMessage::IceCandidate { target, candidate } => {
                if let Some(from) = self.routed_sender(sender, &target, "ice-candidate") {
                    self.peers.handle_remote_candidate(from, candidate).await;
                }
            }
            SignalMessage::Error(error) => {
                warn!("Relay error in room {}: {}", self.transport.room(), error);
                self.events
                    .emit(SessionEvent::Error(SessionError::Relay(error)));
            }
            SignalMessage::JoinRoom { .. } => {
                debug!("Ignoring join-room echoed by relay");
            }
        }
    }

    /// Sender of a peer-to-peer message addressed to us.
    fn routed_sender(
        &self,
        sender: Option<ParticipantId>,
        target: &ParticipantId,
        kind: &str,
    ) -> Option<ParticipantId> {
        if target != self.peers.local() {
            debug!("Dropping {} addressed to {}", kind, target);
            return None;
        }
        if sender.is_none() {
            warn!("Dropping {} without sender", kind);
        }
        sender
    }

    async fn teardown(&mut self) {
        self.peers.close_all().await;
        self.transport.close().await;
    }
}
