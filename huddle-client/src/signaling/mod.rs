mod connector;
mod signaling_output;
mod signaling_transport;
mod transport_event;
mod ws_connector;

pub use connector::*;
pub use signaling_output::*;
pub use signaling_transport::*;
pub use transport_event::*;
pub use ws_connector::*;
