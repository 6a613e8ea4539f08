use crate::directory::MeetingDirectory;
use crate::error::{Result, SessionError};
use crate::media::{LocalMediaSet, MediaCaptureManager, MediaDeviceProvider};
use crate::peer::{ParticipantInfo, PeerManager, PeerState};
use crate::session::{EventEmitter, SessionActor, SessionCommand, SessionConfig, SessionEvent};
use crate::signaling::{SignalingConnector, SignalingTransport};
use crate::transport::ConnectionFactory;
use huddle_core::{Envelope, ParticipantId, RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

struct ActiveSession {
    room: RoomId,
    participant: ParticipantId,
    transport: SignalingTransport,
    command_tx: mpsc::Sender<SessionCommand>,
    task: JoinHandle<()>,
}

/// Entry point for the presentation layer. One membership at a time.
pub struct RoomSession {
    config: SessionConfig,
    media: Arc<MediaCaptureManager>,
    connector: Arc<dyn SignalingConnector>,
    factory: Arc<dyn ConnectionFactory>,
    events: EventEmitter,
    active: Mutex<Option<ActiveSession>>,
}

impl RoomSession {
    pub fn new(
        config: SessionConfig,
        devices: Arc<dyn MediaDeviceProvider>,
        connector: Arc<dyn SignalingConnector>,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Self {
        let events = EventEmitter::new(config.event_capacity);
        Self {
            config,
            media: Arc::new(MediaCaptureManager::new(devices)),
            connector,
            factory,
            events,
            active: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Acquires media, opens the relay channel and announces us.
    ///
    /// Returns once the channel is open; connections to the other members
    /// are set up in the background.
    pub async fn join(
        &self,
        room: RoomId,
        participant: ParticipantId,
        name: impl Into<String>,
    ) -> Result<()> {
        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            if !current.task.is_finished() {
                return Err(SessionError::AlreadyJoined(current.room.clone()));
            }
        }
        *active = None;

        let media = match self.media.acquire(&self.config.constraints).await {
            Ok(media) => media,
            Err(e) => return Err(self.abort(SessionError::MediaAcquisition(e))),
        };

        let (transport_tx, transport_rx) = mpsc::channel(self.config.event_capacity);
        let transport =
            match SignalingTransport::open(self.connector.as_ref(), room.clone(), transport_tx)
                .await
            {
                Ok(transport) => transport,
                Err(e) => {
                    self.media.release().await;
                    return Err(self.abort(SessionError::Transport(format!("{e:#}"))));
                }
            };

        let (connection_tx, connection_rx) = mpsc::channel(self.config.event_capacity);
        let peers = PeerManager::new(
            participant.clone(),
            Arc::clone(&self.factory),
            Arc::new(transport.clone()),
            connection_tx,
            self.events.clone(),
        )
        .with_local_media(media)
        .with_handshake_timeout(self.config.handshake_timeout);

        transport
            .send(Envelope::new(SignalMessage::JoinRoom {
                room: room.clone(),
                participant: participant.clone(),
                name: name.into(),
            }))
            .await;

        let (command_tx, command_rx) = mpsc::channel(32);
        let actor = SessionActor::new(
            peers,
            transport.clone(),
            Arc::clone(&self.media),
            self.events.clone(),
            command_rx,
            transport_rx,
            connection_rx,
        );
        let task = tokio::spawn(actor.run());

        info!("Joined room {} as {}", room, participant);
        *active = Some(ActiveSession {
            room,
            participant,
            transport,
            command_tx,
            task,
        });
        Ok(())
    }

    /// Checks the room with the directory before joining it.
    pub async fn join_meeting(
        &self,
        directory: &dyn MeetingDirectory,
        room: RoomId,
        participant: ParticipantId,
        name: impl Into<String>,
    ) -> Result<()> {
        let meeting = directory.join(&room).await?;
        debug!("Directory admitted {} to {}", participant, meeting.title);
        self.join(room, participant, name).await
    }

    /// Closes every connection, the relay channel and the local tracks.
    /// Safe to call at any time, any number of times.
    pub async fn leave(&self) {
        let Some(session) = self.active.lock().await.take() else {
            self.media.release().await;
            return;
        };

        let (done_tx, done_rx) = oneshot::channel();
        if session
            .command_tx
            .send(SessionCommand::Leave { done: done_tx })
            .await
            .is_ok()
        {
            let _ = done_rx.await;
        }
        if let Err(e) = session.task.await {
            error!("Session task for room {} failed: {}", session.room, e);
        }
        session.transport.close().await;
        self.media.release().await;
        info!("{} left room {}", session.participant, session.room);
    }

    pub async fn toggle_video(&self) -> bool {
        self.media.toggle_video().await
    }

    pub async fn toggle_audio(&self) -> bool {
        self.media.toggle_audio().await
    }

    pub async fn local_media(&self) -> LocalMediaSet {
        self.media.local_media().await
    }

    pub async fn is_joined(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| !s.task.is_finished())
    }

    pub async fn current_room(&self) -> Option<RoomId> {
        self.active.lock().await.as_ref().map(|s| s.room.clone())
    }

    /// Connections currently held. Zero when not joined.
    pub async fn peer_count(&self) -> usize {
        self.request(|reply| SessionCommand::PeerCount { reply })
            .await
            .unwrap_or(0)
    }

    pub async fn peer_state(&self, participant: &ParticipantId) -> Option<PeerState> {
        let participant = participant.clone();
        self.request(|reply| SessionCommand::PeerState { participant, reply })
            .await
            .ok()
            .flatten()
    }

    pub async fn participants(&self) -> Vec<ParticipantInfo> {
        self.request(|reply| SessionCommand::Participants { reply })
            .await
            .unwrap_or_default()
    }

    /// Offers again to a participant, replacing its current connection.
    pub async fn retry_peer(&self, participant: &ParticipantId) -> Result<()> {
        let participant = participant.clone();
        self.request(|reply| SessionCommand::RetryPeer { participant, reply })
            .await?
    }

    /// Disposes the connection to a participant without forgetting them.
    pub async fn drop_peer(&self, participant: &ParticipantId) -> Result<()> {
        let participant = participant.clone();
        self.request(|reply| SessionCommand::DropPeer { participant, reply })
            .await?
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T> {
        let command_tx = self
            .active
            .lock()
            .await
            .as_ref()
            .map(|s| s.command_tx.clone())
            .ok_or(SessionError::NotJoined)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::NotJoined)?;
        reply_rx.await.map_err(|_| SessionError::NotJoined)
    }

    fn abort(&self, err: SessionError) -> SessionError {
        error!("Join failed: {}", err);
        self.events.emit(SessionEvent::Error(err.clone()));
        err
    }
}
