mod session;
mod signaling;
mod transform;

pub use session::SessionId;
pub use signaling::{
    ClientMessage, IceCandidate, IceServerConfig, SdpKind, ServerMessage, SessionDescription,
    SignalPayload,
};
pub use transform::{Transform, Vec3};
