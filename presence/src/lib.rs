pub use presence_core::model::{SessionId, Transform, Vec3};

pub mod model {
    pub use presence_core::model::*;
}

pub mod mesh {
    pub use presence_core::mesh::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use presence_server::*;
}

/// Browser engine, exported to JS.
#[cfg(feature = "client")]
pub mod client {
    pub use presence_wasm_gen::*;
}

#[cfg(feature = "native-client")]
pub mod native {
    pub use presence_client::*;
}
