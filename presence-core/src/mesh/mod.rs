//! Client-side peer mesh: which remote sessions we know about, which side
//! offers to whom, and what the driver must do next for each peer.
//!
//! Everything here is sans-io. Inputs return ordered [`MeshAction`]s that the
//! native or browser driver executes against its WebRTC stack, feeding the
//! results back in.

mod action;
mod negotiator;
mod peer_link;
mod roster;
mod session;
mod tie_break;

pub use action::{CloseReason, MeshAction, MeshEvent, TrackInfo};
pub use negotiator::Negotiator;
pub use peer_link::{LinkState, PeerLink, Role};
pub use roster::Roster;
pub use session::MeshSession;
pub use tie_break::initiates;
