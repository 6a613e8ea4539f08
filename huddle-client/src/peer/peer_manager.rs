use crate::error::SessionError;
use crate::media::{LocalMediaSet, RemoteStream, RemoteTrack};
use crate::peer::{PeerConnection, PeerState, Roster};
use crate::session::{EventEmitter, SessionEvent};
use crate::signaling::SignalingOutput;
use crate::transport::{
    ConnectionEvent, ConnectionEventKind, ConnectionFactory, LinkState, MediaConnection,
};
use huddle_core::{ConnectionId, IceCandidate, ParticipantId, SessionDescription};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A remote participant as reported by `PeerManager::participants`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub id: ParticipantId,
    pub name: Option<String>,
    pub state: Option<PeerState>,
}

/// Drives one connection per remote participant through the handshake.
///
/// Owned by the session actor, so every handler runs to completion before
/// the next message or connection event is looked at.
pub struct PeerManager {
    local: ParticipantId,
    roster: Roster,
    factory: Arc<dyn ConnectionFactory>,
    signaling: Arc<dyn SignalingOutput>,
    media: LocalMediaSet,
    connection_tx: mpsc::Sender<ConnectionEvent>,
    events: EventEmitter,
    handshake_timeout: Option<Duration>,
}

impl PeerManager {
    pub fn new(
        local: ParticipantId,
        factory: Arc<dyn ConnectionFactory>,
        signaling: Arc<dyn SignalingOutput>,
        connection_tx: mpsc::Sender<ConnectionEvent>,
        events: EventEmitter,
    ) -> Self {
        Self {
            local,
            roster: Roster::new(),
            factory,
            signaling,
            media: LocalMediaSet::default(),
            connection_tx,
            events,
            handshake_timeout: None,
        }
    }

    pub fn with_local_media(mut self, media: LocalMediaSet) -> Self {
        self.media = media;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn local(&self) -> &ParticipantId {
        &self.local
    }

    /// Connection records held, including failed ones awaiting a retry or
    /// drop decision.
    pub fn peer_count(&self) -> usize {
        self.roster.connection_count()
    }

    pub fn peer_state(&self, participant: &ParticipantId) -> Option<PeerState> {
        self.roster.connection(participant).map(|c| c.state())
    }

    pub fn participants(&self) -> Vec<ParticipantInfo> {
        self.roster
            .ids()
            .into_iter()
            .map(|id| ParticipantInfo {
                name: self.roster.name(&id).map(str::to_owned),
                state: self.peer_state(&id),
                id,
            })
            .collect()
    }

    /// Someone entered the room. Existing members make the offer.
    pub async fn handle_peer_joined(&mut self, participant: ParticipantId, name: String) {
        if participant == self.local {
            debug!("Ignoring our own join notification");
            return;
        }

        let was_named = self.roster.name(&participant).is_some();
        self.roster.upsert(&participant, Some(name.clone()));
        if !was_named {
            info!("Participant {} ({}) joined", participant, name);
            self.events.emit(SessionEvent::UserJoined {
                participant: participant.clone(),
                name,
            });
        }

        match self.peer_state(&participant) {
            Some(state) if !state.is_terminal() => {
                debug!(
                    "Duplicate join for {} while {}, keeping connection",
                    participant, state
                );
            }
            Some(_) => {
                info!("Replacing failed connection to {}", participant);
                self.dispose(&participant).await;
                self.start_offer(&participant).await;
            }
            None => self.start_offer(&participant).await,
        }
    }

    pub async fn handle_offer(&mut self, from: ParticipantId, description: SessionDescription) {
        if from == self.local {
            return;
        }
        self.roster.upsert(&from, None);

        match self.peer_state(&from) {
            None => {}
            Some(PeerState::OfferSent) => {
                if self.local < from {
                    debug!("Offer collision with {}, keeping ours", from);
                    return;
                }
                debug!("Offer collision with {}, yielding", from);
                self.dispose(&from).await;
            }
            Some(PeerState::AnswerSent | PeerState::Connected) => {
                self.renegotiate(&from, &description).await;
                return;
            }
            Some(_) => self.dispose(&from).await,
        }

        self.start_answer(&from, &description).await;
    }

    pub async fn handle_answer(&mut self, from: ParticipantId, description: SessionDescription) {
        let Some(conn) = self.roster.connection_mut(&from) else {
            debug!("Answer from {} without a connection, dropping", from);
            return;
        };

        if conn.state() != PeerState::OfferSent {
            let reason = format!("unexpected answer in state {}", conn.state());
            warn!("{} from {}, dropping", reason, from);
            self.fail(&from, SessionError::handshake(&from, reason)).await;
            return;
        }

        if let Err(e) = conn.apply_remote_description(&description).await {
            error!("Failed to apply answer from {}: {:#}", from, e);
            self.fail(&from, SessionError::handshake(&from, format!("{e:#}")))
                .await;
        }
    }

    pub async fn handle_remote_candidate(&mut self, from: ParticipantId, candidate: IceCandidate) {
        let Some(conn) = self.roster.connection_mut(&from) else {
            debug!("Candidate from {} without a connection, dropping", from);
            return;
        };
        if conn.state().is_terminal() {
            debug!("Candidate from {} for a {} connection, dropping", from, conn.state());
            return;
        }
        match conn.add_remote_candidate(candidate).await {
            Ok(true) => debug!(
                "Buffered candidate from {} ({} pending)",
                from,
                conn.pending_candidates()
            ),
            Ok(false) => {}
            Err(e) => warn!("Failed to add candidate from {}: {:#}", from, e),
        }
    }

    pub async fn handle_peer_left(&mut self, participant: ParticipantId) {
        if participant == self.local {
            return;
        }
        let Some(mut record) = self.roster.remove(&participant) else {
            debug!("Unknown participant {} left", participant);
            return;
        };

        if let Some(conn) = record.take_connection() {
            self.close_connection(conn).await;
        }
        info!("Participant {} left", participant);
        self.events.emit(SessionEvent::UserLeft {
            participant,
            name: record.name,
        });
    }

    pub async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        let participant = event.participant;
        let Some(conn) = self.roster.connection_mut(&participant) else {
            debug!("Event for {} with no connection, dropping", participant);
            return;
        };
        if conn.id() != event.connection {
            debug!("Stale event from replaced connection to {}", participant);
            return;
        }
        if conn.state().is_terminal() {
            return;
        }

        match event.kind {
            ConnectionEventKind::LocalCandidate(candidate) => {
                self.signaling.send_ice(participant, candidate).await;
            }
            ConnectionEventKind::StateChanged(LinkState::Connected) => {
                if conn.transition(PeerState::Connected) {
                    info!("Connected to {}", participant);
                    self.emit_state(&participant, PeerState::Connected);
                }
            }
            ConnectionEventKind::StateChanged(LinkState::Failed) => {
                let err = SessionError::connection(&participant, "media transport failed");
                self.fail(&participant, err).await;
            }
            ConnectionEventKind::StateChanged(LinkState::Closed) => {
                let err = SessionError::connection(&participant, "media transport closed");
                self.fail(&participant, err).await;
            }
            ConnectionEventKind::StateChanged(state) => {
                debug!("Link to {} is {}", participant, state);
            }
            ConnectionEventKind::TrackAdded(track) => {
                self.on_remote_track(&participant, track);
            }
            ConnectionEventKind::HandshakeTimeout => {
                let state = conn.state();
                if matches!(state, PeerState::OfferSent | PeerState::AnswerSent) {
                    warn!("Handshake with {} timed out in {}", participant, state);
                    let err = SessionError::handshake(&participant, "timed out");
                    self.fail(&participant, err).await;
                }
            }
        }
    }

    /// Starts over as the offering side toward a known participant.
    pub async fn retry(&mut self, participant: &ParticipantId) -> Result<(), SessionError> {
        if !self.roster.contains(participant) {
            return Err(SessionError::UnknownParticipant(participant.clone()));
        }
        info!("Retrying connection to {}", participant);
        self.dispose(participant).await;
        self.start_offer(participant).await;
        Ok(())
    }

    /// Disposes the connection but keeps the participant in the roster.
    pub async fn drop_peer(&mut self, participant: &ParticipantId) -> Result<(), SessionError> {
        if !self.roster.contains(participant) {
            return Err(SessionError::UnknownParticipant(participant.clone()));
        }
        if let Some(conn) = self.roster.take_connection(participant) {
            self.close_connection(conn).await;
        }
        Ok(())
    }

    /// Closes every connection and forgets every participant.
    /// Local tracks are left alone.
    pub async fn close_all(&mut self) {
        for mut record in self.roster.drain() {
            if let Some(conn) = record.take_connection() {
                self.close_connection(conn).await;
            }
        }
    }

    async fn start_offer(&mut self, participant: &ParticipantId) {
        let Some(mut conn) = self.create_connection(participant).await else {
            return;
        };

        let offer = match Self::offer_steps(&conn, &self.media).await {
            Ok(offer) => offer,
            Err(e) => {
                error!("Failed to offer to {}: {:#}", participant, e);
                self.insert_failed(conn, SessionError::handshake(participant, format!("{e:#}")))
                    .await;
                return;
            }
        };

        conn.transition(PeerState::OfferSent);
        self.arm_handshake_timer(&mut conn);
        self.insert(conn);
        self.emit_state(participant, PeerState::OfferSent);
        self.signaling.send_offer(participant.clone(), offer).await;
    }

    async fn start_answer(&mut self, participant: &ParticipantId, offer: &SessionDescription) {
        let Some(mut conn) = self.create_connection(participant).await else {
            return;
        };

        let answer = match Self::answer_steps(&mut conn, &self.media, offer).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Failed to answer {}: {:#}", participant, e);
                self.insert_failed(conn, SessionError::handshake(participant, format!("{e:#}")))
                    .await;
                return;
            }
        };

        conn.transition(PeerState::AnswerSent);
        self.arm_handshake_timer(&mut conn);
        self.insert(conn);
        self.emit_state(participant, PeerState::AnswerSent);
        self.signaling.send_answer(participant.clone(), answer).await;
    }

    /// A new offer on an established connection. The state is kept.
    async fn renegotiate(&mut self, from: &ParticipantId, offer: &SessionDescription) {
        let Some(conn) = self.roster.connection_mut(from) else {
            return;
        };
        debug!("Renegotiating with {} in {}", from, conn.state());

        let result = async {
            conn.apply_remote_description(offer).await?;
            let answer = conn.media().create_answer().await?;
            conn.media().set_local_description(&answer).await?;
            anyhow::Ok(answer)
        }
        .await;

        match result {
            Ok(answer) => self.signaling.send_answer(from.clone(), answer).await,
            Err(e) => {
                error!("Renegotiation with {} failed: {:#}", from, e);
                self.fail(from, SessionError::handshake(from, format!("{e:#}")))
                    .await;
            }
        }
    }

    async fn offer_steps(
        conn: &PeerConnection,
        media: &LocalMediaSet,
    ) -> anyhow::Result<SessionDescription> {
        Self::attach_tracks(conn.media(), media).await?;
        let offer = conn.media().create_offer().await?;
        conn.media().set_local_description(&offer).await?;
        Ok(offer)
    }

    async fn answer_steps(
        conn: &mut PeerConnection,
        media: &LocalMediaSet,
        offer: &SessionDescription,
    ) -> anyhow::Result<SessionDescription> {
        Self::attach_tracks(conn.media(), media).await?;
        conn.apply_remote_description(offer).await?;
        let answer = conn.media().create_answer().await?;
        conn.media().set_local_description(&answer).await?;
        Ok(answer)
    }

    async fn attach_tracks(connection: &dyn MediaConnection, media: &LocalMediaSet) -> anyhow::Result<()> {
        for track in media.tracks().iter().filter(|t| !t.is_stopped()) {
            connection.add_track(Arc::clone(track)).await?;
        }
        Ok(())
    }

    async fn create_connection(&mut self, participant: &ParticipantId) -> Option<PeerConnection> {
        let id = ConnectionId::new();
        match self
            .factory
            .create(participant.clone(), id, self.connection_tx.clone())
            .await
        {
            Ok(media) => Some(PeerConnection::new(id, participant.clone(), media)),
            Err(e) => {
                error!("Failed to create connection to {}: {:#}", participant, e);
                self.events.emit(SessionEvent::Error(SessionError::connection(
                    participant,
                    format!("{e:#}"),
                )));
                None
            }
        }
    }

    fn insert(&mut self, conn: PeerConnection) {
        if let Err(conn) = self.roster.insert_connection(conn) {
            // Callers dispose the previous connection first.
            error!("Connection to {} already present, discarding", conn.participant());
        }
    }

    async fn insert_failed(&mut self, mut conn: PeerConnection, err: SessionError) {
        conn.close().await;
        conn.transition(PeerState::Failed);
        let participant = conn.participant().clone();
        self.insert(conn);
        self.emit_state(&participant, PeerState::Failed);
        self.events.emit(SessionEvent::Error(err));
    }

    /// Moves a live connection to `Failed` and reports it.
    async fn fail(&mut self, participant: &ParticipantId, err: SessionError) {
        let Some(conn) = self.roster.connection_mut(participant) else {
            return;
        };
        if !conn.transition(PeerState::Failed) {
            return;
        }
        conn.close().await;
        let had_stream = conn.take_remote_stream().is_some();

        self.emit_state(participant, PeerState::Failed);
        if had_stream {
            self.events.emit(SessionEvent::RemoteStreamRemoved {
                participant: participant.clone(),
            });
        }
        self.events.emit(SessionEvent::Error(err));
    }

    /// Closes and forgets the current connection without reporting it.
    async fn dispose(&mut self, participant: &ParticipantId) {
        if let Some(mut conn) = self.roster.take_connection(participant) {
            conn.close().await;
        }
    }

    async fn close_connection(&self, mut conn: PeerConnection) {
        let participant = conn.participant().clone();
        conn.close().await;
        if conn.transition(PeerState::Closed) {
            self.emit_state(&participant, PeerState::Closed);
        }
        if conn.take_remote_stream().is_some() {
            self.events
                .emit(SessionEvent::RemoteStreamRemoved { participant });
        }
    }

    fn on_remote_track(&mut self, participant: &ParticipantId, track: RemoteTrack) {
        let Some(conn) = self.roster.connection_mut(participant) else {
            return;
        };
        if let Some(stream) = conn.remote_stream() {
            stream.add_track(track);
            return;
        }

        let stream = RemoteStream::new(participant.clone(), track);
        conn.set_remote_stream(stream.clone());
        info!("Remote stream from {}", participant);
        self.events.emit(SessionEvent::RemoteStreamAdded {
            participant: participant.clone(),
            stream,
        });
    }

    fn arm_handshake_timer(&self, conn: &mut PeerConnection) {
        let Some(timeout) = self.handshake_timeout else {
            return;
        };
        let tx = self.connection_tx.clone();
        let participant = conn.participant().clone();
        let connection = conn.id();
        conn.set_handshake_timer(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = tx
                .send(ConnectionEvent {
                    participant,
                    connection,
                    kind: ConnectionEventKind::HandshakeTimeout,
                })
                .await;
        }));
    }

    fn emit_state(&self, participant: &ParticipantId, state: PeerState) {
        self.events.emit(SessionEvent::PeerStateChanged {
            participant: participant.clone(),
            state,
        });
    }
}
