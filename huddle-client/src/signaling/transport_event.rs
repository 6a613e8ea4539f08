use huddle_core::Envelope;

#[derive(Debug, Clone)]
pub enum TransportEvent {
    Message(Envelope),
    /// The relay closed the channel or the connection dropped.
    Closed,
}
