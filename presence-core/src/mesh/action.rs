use crate::mesh::peer_link::LinkState;
use crate::model::{ClientMessage, IceCandidate, SessionDescription, SessionId, Transform};
use serde::Serialize;

/// A remote media track as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    pub track_id: String,
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Departed,
    Failed,
    /// The handshake did not reach `Connected` within the driver's deadline.
    TimedOut,
    /// The remote initiator started over with a fresh offer.
    Replaced,
    RelayLost,
}

/// Notifications for the application layer (scene graph, media elements, UI).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MeshEvent {
    Welcomed {
        session_id: SessionId,
    },
    AvatarUpdated {
        id: SessionId,
        transform: Transform,
    },
    AvatarRemoved {
        id: SessionId,
    },
    LiveCount {
        count: usize,
    },
    PeerStateChanged {
        remote: SessionId,
        state: LinkState,
    },
    TrackReceived {
        remote: SessionId,
        track: TrackInfo,
    },
    PeerClosed {
        remote: SessionId,
        reason: CloseReason,
    },
    MediaUnavailable {
        reason: String,
    },
}

/// Work the driver has to carry out, in order, for the named peer.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshAction {
    /// Allocate a peer connection for `remote` and attach whatever local
    /// tracks are available (possibly none).
    OpenPeer { remote: SessionId },
    /// Create an offer, set it as local description, report it back through
    /// `Negotiator::local_description_ready`.
    CreateOffer { remote: SessionId },
    /// Create an answer, set it as local description, report it back.
    CreateAnswer { remote: SessionId },
    ApplyRemoteDescription {
        remote: SessionId,
        description: SessionDescription,
    },
    AddIceCandidate {
        remote: SessionId,
        candidate: IceCandidate,
    },
    /// Send a frame to the relay.
    Send(ClientMessage),
    /// Tear down the peer connection and everything attached to it.
    ClosePeer { remote: SessionId },
    Notify(MeshEvent),
}

impl MeshAction {
    /// The peer whose worker must run this action, if any.
    pub fn remote(&self) -> Option<&SessionId> {
        match self {
            MeshAction::OpenPeer { remote }
            | MeshAction::CreateOffer { remote }
            | MeshAction::CreateAnswer { remote }
            | MeshAction::ApplyRemoteDescription { remote, .. }
            | MeshAction::AddIceCandidate { remote, .. }
            | MeshAction::ClosePeer { remote } => Some(remote),
            MeshAction::Send(_) | MeshAction::Notify(_) => None,
        }
    }
}
