/// Settings for the webrtc connections created by `RtcConnectionFactory`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<String>,
    /// Gather host candidates on loopback interfaces. Needed when both peers
    /// run on one machine without network access.
    pub include_loopback_candidates: bool,
}

impl TransportConfig {
    pub fn local() -> Self {
        Self {
            ice_servers: Vec::new(),
            include_loopback_candidates: true,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                "stun:stun.l.google.com:19302".to_owned(),
                "stun:stun1.l.google.com:19302".to_owned(),
            ],
            include_loopback_candidates: false,
        }
    }
}
