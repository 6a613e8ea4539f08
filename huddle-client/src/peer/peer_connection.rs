use crate::media::RemoteStream;
use crate::peer::PeerState;
use crate::transport::MediaConnection;
use huddle_core::{ConnectionId, IceCandidate, ParticipantId, SessionDescription};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The local record of one media connection to a remote participant.
pub struct PeerConnection {
    id: ConnectionId,
    participant: ParticipantId,
    state: PeerState,
    media: Box<dyn MediaConnection>,
    pending_candidates: Vec<IceCandidate>,
    remote_description_set: bool,
    remote_stream: Option<RemoteStream>,
    handshake_timer: Option<JoinHandle<()>>,
}

impl PeerConnection {
    pub fn new(id: ConnectionId, participant: ParticipantId, media: Box<dyn MediaConnection>) -> Self {
        Self {
            id,
            participant,
            state: PeerState::New,
            media,
            pending_candidates: Vec::new(),
            remote_description_set: false,
            remote_stream: None,
            handshake_timer: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub fn media(&self) -> &dyn MediaConnection {
        self.media.as_ref()
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub(crate) fn set_remote_stream(&mut self, stream: RemoteStream) {
        self.remote_stream = Some(stream);
    }

    pub(crate) fn take_remote_stream(&mut self) -> Option<RemoteStream> {
        self.remote_stream.take()
    }

    pub(crate) fn set_handshake_timer(&mut self, timer: JoinHandle<()>) {
        self.cancel_handshake_timer();
        self.handshake_timer = Some(timer);
    }

    pub(crate) fn cancel_handshake_timer(&mut self) {
        if let Some(timer) = self.handshake_timer.take() {
            timer.abort();
        }
    }

    /// Moves to `next` if the state machine allows it.
    pub(crate) fn transition(&mut self, next: PeerState) -> bool {
        if self.state == next {
            return false;
        }
        if !self.state.can_transition_to(next) {
            warn!(
                "Ignoring transition {} -> {} for {}",
                self.state, next, self.participant
            );
            return false;
        }
        debug!("Peer {} {} -> {}", self.participant, self.state, next);
        self.state = next;
        if next != PeerState::OfferSent && next != PeerState::AnswerSent {
            self.cancel_handshake_timer();
        }
        true
    }

    /// Applies the remote description, then flushes every buffered
    /// candidate in arrival order.
    pub(crate) async fn apply_remote_description(
        &mut self,
        description: &SessionDescription,
    ) -> anyhow::Result<()> {
        self.media.set_remote_description(description).await?;
        self.remote_description_set = true;

        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.media.add_ice_candidate(&candidate).await {
                warn!("Buffered candidate for {} rejected: {}", self.participant, e);
            }
        }
        Ok(())
    }

    /// Applies a remote candidate, or buffers it until the remote description
    /// is known. Returns `true` when buffered.
    pub(crate) async fn add_remote_candidate(&mut self, candidate: IceCandidate) -> anyhow::Result<bool> {
        if !self.remote_description_set {
            self.pending_candidates.push(candidate);
            return Ok(true);
        }
        self.media.add_ice_candidate(&candidate).await?;
        Ok(false)
    }

    /// Closes the media connection and drops anything buffered.
    pub(crate) async fn close(&mut self) {
        self.cancel_handshake_timer();
        self.pending_candidates.clear();
        if let Err(e) = self.media.close().await {
            debug!("Closing connection to {} failed: {}", self.participant, e);
        }
    }
}

impl Drop for PeerConnection {
    fn drop(&mut self) {
        self.cancel_handshake_timer();
    }
}
