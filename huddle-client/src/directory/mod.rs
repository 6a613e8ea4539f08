mod in_memory;
mod meeting;

pub use in_memory::*;
pub use meeting::*;
