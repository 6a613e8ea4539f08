mod connection_event;
mod media_connection;
mod rtc_connection;
mod transport_config;

pub use connection_event::*;
pub use media_connection::*;
pub use rtc_connection::*;
pub use transport_config::*;
