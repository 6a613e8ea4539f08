mod hub;
mod relay_config;
mod server;
mod ws_handler;

pub use hub::*;
pub use relay_config::*;
pub use server::*;
pub use ws_handler::*;
