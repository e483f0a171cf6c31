mod peer_worker;

pub use peer_worker::*;
