use crate::media::{LocalTrack, MediaConstraints};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("permission to use capture devices was denied")]
    PermissionDenied,

    #[error("no {0} device is available")]
    DeviceUnavailable(String),

    #[error("constraint {0} cannot be satisfied")]
    Overconstrained(String),
}

/// Source of local capture tracks.
#[async_trait]
pub trait MediaDeviceProvider: Send + Sync {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Vec<Arc<LocalTrack>>, DeviceError>;
}
