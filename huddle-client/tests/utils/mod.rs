
pub use event_helpers::*;
pub use hub_connector::*;
pub use mock_connection::*;
pub use mock_signaling::*;
