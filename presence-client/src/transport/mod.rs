mod peer_event;
mod peer_transport;
mod rtc_transport;

pub use peer_event::*;
pub use peer_transport::*;
pub use rtc_transport::*;
