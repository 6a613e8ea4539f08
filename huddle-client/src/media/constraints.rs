use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

/// Preferred camera settings. `None` means any value is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VideoConstraints {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<u32>,
    pub facing_mode: Option<FacingMode>,
}

/// What to ask the capture devices for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: Option<VideoConstraints>,
}

impl MediaConstraints {
    /// Audio plus video with no preferences. Used when the preferred
    /// constraints cannot be satisfied.
    pub fn basic() -> Self {
        Self {
            audio: true,
            video: Some(VideoConstraints::default()),
        }
    }

    pub fn audio_only() -> Self {
        Self {
            audio: true,
            video: None,
        }
    }

    pub fn is_basic(&self) -> bool {
        *self == Self::basic()
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: Some(VideoConstraints {
                width: Some(1280),
                height: Some(720),
                frame_rate: None,
                facing_mode: Some(FacingMode::User),
            }),
        }
    }
}
