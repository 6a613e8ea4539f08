use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Origins allowed to open a WebSocket. Empty accepts any origin.
    pub allowed_origins: Vec<String>,
    /// Messages queued per client before the client is dropped.
    pub queue_capacity: usize,
}

impl RelayConfig {
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        origin.is_some_and(|o| self.allowed_origins.iter().any(|allowed| allowed == o))
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            allowed_origins: Vec::new(),
            queue_capacity: 256,
        }
    }
}
