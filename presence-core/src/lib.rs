pub mod error;
pub mod mesh;
pub mod model;
pub mod utils;

pub use error::ProtocolError;
pub use model::*;
