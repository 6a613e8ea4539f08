mod peer_connection;
mod peer_manager;
mod peer_state;
mod roster;

pub use peer_connection::*;
pub use peer_manager::*;
pub use peer_state::*;
pub use roster::*;
