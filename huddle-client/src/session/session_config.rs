use crate::media::MediaConstraints;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub constraints: MediaConstraints,
    /// How long a connection may stay in the handshake before it is marked
    /// failed. `None` waits forever.
    pub handshake_timeout: Option<Duration>,
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            constraints: MediaConstraints::default(),
            handshake_timeout: Some(Duration::from_secs(30)),
            event_capacity: 256,
        }
    }
}
