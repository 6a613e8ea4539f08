mod capture_manager;
mod constraints;
mod device;
mod local_track;
mod remote_stream;
mod synthetic;

pub use capture_manager::*;
pub use constraints::*;
pub use device::*;
pub use local_track::*;
pub use remote_stream::*;
pub use synthetic::*;
