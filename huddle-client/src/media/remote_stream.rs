use crate::media::TrackKind;
use dashmap::DashMap;
use huddle_core::ParticipantId;
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// A track received from a remote participant.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
    pub stream_id: String,
    /// The underlying receiver. Absent for tracks produced by test doubles.
    pub source: Option<Arc<TrackRemote>>,
}

impl RemoteTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind, stream_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            stream_id: stream_id.into(),
            source: None,
        }
    }
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("stream_id", &self.stream_id)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

/// The media a remote participant sends us. Clones share the same track set.
#[derive(Clone, Debug)]
pub struct RemoteStream {
    id: String,
    participant: ParticipantId,
    tracks: Arc<DashMap<String, RemoteTrack>>,
}

impl RemoteStream {
    pub fn new(participant: ParticipantId, first: RemoteTrack) -> Self {
        let stream = Self {
            id: first.stream_id.clone(),
            participant,
            tracks: Arc::new(DashMap::new()),
        };
        stream.add_track(first);
        stream
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn add_track(&self, track: RemoteTrack) {
        self.tracks.insert(track.id.clone(), track);
    }

    pub fn tracks(&self) -> Vec<RemoteTrack> {
        self.tracks.iter().map(|t| t.value().clone()).collect()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
