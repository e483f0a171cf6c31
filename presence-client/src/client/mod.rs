mod mesh_client;
mod relay_connection;

pub use mesh_client::*;
pub use relay_connection::*;
