mod client;
mod config;
mod error;
mod peer;
mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use peer::*;
pub use transport::*;
