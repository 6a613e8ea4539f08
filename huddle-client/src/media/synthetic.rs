use crate::media::{
    DeviceError, LocalMediaSet, LocalTrack, MediaConstraints, MediaDeviceProvider, TrackKind,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const STREAM_ID: &str = "huddle-local";
const FRAME_INTERVAL: Duration = Duration::from_millis(20);
// A 20 ms Opus frame of silence.
const OPUS_SILENCE: &[u8] = &[0xf8, 0xff, 0xfe];
// VP8 interframe header with an empty partition.
const VP8_PLACEHOLDER: &[u8] = &[0x31, 0x00, 0x00];

/// What the fake devices can deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub permission_granted: bool,
    pub microphone: bool,
    pub camera: Option<CameraCapabilities>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraCapabilities {
    pub max_width: u32,
    pub max_height: u32,
    pub max_frame_rate: u32,
}

impl DeviceCapabilities {
    pub fn camera(max_width: u32, max_height: u32, max_frame_rate: u32) -> Self {
        Self {
            permission_granted: true,
            microphone: true,
            camera: Some(CameraCapabilities {
                max_width,
                max_height,
                max_frame_rate,
            }),
        }
    }

    pub fn microphone_only() -> Self {
        Self {
            permission_granted: true,
            microphone: true,
            camera: None,
        }
    }

    pub fn denied() -> Self {
        Self {
            permission_granted: false,
            ..Self::default()
        }
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self::camera(1920, 1080, 60)
    }
}

/// Device provider backed by webrtc-rs sample tracks instead of hardware.
///
/// Every request is recorded so callers can check what was asked for.
pub struct SyntheticDevices {
    capabilities: DeviceCapabilities,
    requests: Mutex<Vec<MediaConstraints>>,
}

impl SyntheticDevices {
    pub fn new(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn check(&self, constraints: &MediaConstraints) -> Result<(), DeviceError> {
        if !self.capabilities.permission_granted {
            return Err(DeviceError::PermissionDenied);
        }
        if constraints.audio && !self.capabilities.microphone {
            return Err(DeviceError::DeviceUnavailable("microphone".into()));
        }
        let Some(video) = &constraints.video else {
            return Ok(());
        };
        let Some(camera) = &self.capabilities.camera else {
            return Err(DeviceError::DeviceUnavailable("camera".into()));
        };
        if video.width.is_some_and(|w| w > camera.max_width) {
            return Err(DeviceError::Overconstrained("width".into()));
        }
        if video.height.is_some_and(|h| h > camera.max_height) {
            return Err(DeviceError::Overconstrained("height".into()));
        }
        if video.frame_rate.is_some_and(|f| f > camera.max_frame_rate) {
            return Err(DeviceError::Overconstrained("frame_rate".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaDeviceProvider for SyntheticDevices {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Vec<Arc<LocalTrack>>, DeviceError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(constraints.clone());
        }
        self.check(constraints)?;

        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(Arc::new(LocalTrack::new(
                TrackKind::Audio,
                "synthetic microphone",
                sample_track(MIME_TYPE_OPUS, 48000, 2),
            )));
        }
        if constraints.video.is_some() {
            tracks.push(Arc::new(LocalTrack::new(
                TrackKind::Video,
                "synthetic camera",
                sample_track(MIME_TYPE_VP8, 90000, 0),
            )));
        }
        Ok(tracks)
    }
}

/// A placeholder frame for a track of the given kind.
pub fn placeholder_sample(kind: TrackKind) -> Sample {
    let data = match kind {
        TrackKind::Audio => OPUS_SILENCE,
        TrackKind::Video => VP8_PLACEHOLDER,
    };
    Sample {
        data: Bytes::from_static(data),
        duration: FRAME_INTERVAL,
        ..Default::default()
    }
}

/// Writes placeholder frames to every track in `media` until all of them
/// are stopped.
pub fn spawn_sample_feed(media: LocalMediaSet) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        loop {
            ticker.tick().await;
            let mut live = 0;
            for track in media.tracks().iter().filter(|t| !t.is_stopped()) {
                live += 1;
                let sample = placeholder_sample(track.kind());
                if let Err(e) = track.write_sample(&sample).await {
                    debug!("Dropping sample for {}: {}", track.id(), e);
                }
            }
            if live == 0 {
                debug!("All local tracks stopped, sample feed finished");
                break;
            }
        }
    })
}

fn sample_track(mime_type: &str, clock_rate: u32, channels: u16) -> Arc<TrackLocalStaticSample> {
    Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: mime_type.to_owned(),
            clock_rate,
            channels,
            ..Default::default()
        },
        Uuid::new_v4().to_string(),
        STREAM_ID.to_owned(),
    ))
}
