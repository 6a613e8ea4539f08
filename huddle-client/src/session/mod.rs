mod room_session;
mod session_actor;
mod session_command;
mod session_config;
mod session_event;

pub use room_session::*;
pub(crate) use session_actor::*;
pub(crate) use session_command::*;
pub use session_config::*;
pub use session_event::*;
