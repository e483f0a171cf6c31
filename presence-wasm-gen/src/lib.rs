mod bindings;
mod engine;
mod error;
mod logger;

pub use bindings::*;
pub use engine::*;
pub use error::*;
