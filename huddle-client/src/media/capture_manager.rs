use crate::media::{
    DeviceError, LocalMediaSet, LocalTrack, MediaConstraints, MediaDeviceProvider, TrackKind,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Owns the local capture tracks for one session.
pub struct MediaCaptureManager {
    provider: Arc<dyn MediaDeviceProvider>,
    tracks: RwLock<Vec<Arc<LocalTrack>>>,
}

impl MediaCaptureManager {
    pub fn new(provider: Arc<dyn MediaDeviceProvider>) -> Self {
        Self {
            provider,
            tracks: RwLock::new(Vec::new()),
        }
    }

    /// Acquires fresh tracks, stopping any that are already held.
    ///
    /// An overconstrained request is retried once with the basic constraint
    /// set before the error is surfaced.
    pub async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalMediaSet, DeviceError> {
        self.release().await;

        let tracks = match self.provider.get_user_media(constraints).await {
            Ok(tracks) => tracks,
            Err(DeviceError::Overconstrained(constraint)) if !constraints.is_basic() => {
                warn!(
                    "Constraint {} cannot be satisfied, retrying with basic constraints",
                    constraint
                );
                self.provider
                    .get_user_media(&MediaConstraints::basic())
                    .await?
            }
            Err(e) => return Err(e),
        };

        info!("Acquired {} local track(s)", tracks.len());
        let mut held = self.tracks.write().await;
        *held = tracks;
        Ok(LocalMediaSet::new(held.clone()))
    }

    /// Flips the first video track. Returns the new enabled flag, or `false`
    /// when there is no video track.
    pub async fn toggle_video(&self) -> bool {
        self.toggle(TrackKind::Video).await
    }

    pub async fn toggle_audio(&self) -> bool {
        self.toggle(TrackKind::Audio).await
    }

    /// Stops every held track. Safe to call repeatedly.
    pub async fn release(&self) {
        let mut held = self.tracks.write().await;
        for track in held.drain(..) {
            if track.stop() {
                debug!("Stopped local {} track {}", track.kind(), track.id());
            }
        }
    }

    pub async fn local_media(&self) -> LocalMediaSet {
        LocalMediaSet::new(self.tracks.read().await.clone())
    }

    async fn toggle(&self, kind: TrackKind) -> bool {
        let held = self.tracks.read().await;
        match held.iter().find(|t| t.kind() == kind) {
            Some(track) => {
                let enabled = track.toggle();
                debug!("Local {} track {} enabled={}", kind, track.id(), enabled);
                enabled
            }
            None => false,
        }
    }
}
