use crate::error::ProtocolError;
use crate::model::session::SessionId;
use crate::model::transform::{Transform, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Trickle ICE candidate in the browser's `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

/// Handshake body shared by both directions; the routing key (`to` on the
/// way in, `from` on the way out) lives in the enclosing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalPayload {
    Offer { sdp: String },
    Answer { sdp: String },
    IceCandidate { candidate: IceCandidate },
}

impl SignalPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            SignalPayload::Offer { .. } => "offer",
            SignalPayload::Answer { .. } => "answer",
            SignalPayload::IceCandidate { .. } => "ice-candidate",
        }
    }
}

/// Frames a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ClientMessage {
    Transform(Transform),
    Offer {
        to: SessionId,
        sdp: String,
    },
    Answer {
        to: SessionId,
        sdp: String,
    },
    IceCandidate {
        to: SessionId,
        candidate: IceCandidate,
    },
}

impl ClientMessage {
    pub fn directed(to: SessionId, payload: SignalPayload) -> Self {
        match payload {
            SignalPayload::Offer { sdp } => ClientMessage::Offer { to, sdp },
            SignalPayload::Answer { sdp } => ClientMessage::Answer { to, sdp },
            SignalPayload::IceCandidate { candidate } => {
                ClientMessage::IceCandidate { to, candidate }
            }
        }
    }

    /// Splits a handshake frame into its recipient and body.
    pub fn into_directed(self) -> Option<(SessionId, SignalPayload)> {
        match self {
            ClientMessage::Transform(_) => None,
            ClientMessage::Offer { to, sdp } => Some((to, SignalPayload::Offer { sdp })),
            ClientMessage::Answer { to, sdp } => Some((to, SignalPayload::Answer { sdp })),
            ClientMessage::IceCandidate { to, candidate } => {
                Some((to, SignalPayload::IceCandidate { candidate }))
            }
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

/// Frames the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ServerMessage {
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    Welcome {
        session_id: SessionId,
    },
    Transform {
        id: SessionId,
        #[serde(default)]
        position: Vec3,
        #[serde(default)]
        rotation: Vec3,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        auxiliary: Map<String, Value>,
    },
    Joined {
        id: SessionId,
    },
    Departed {
        id: SessionId,
    },
    LiveCount {
        count: usize,
    },
    Offer {
        from: SessionId,
        sdp: String,
    },
    Answer {
        from: SessionId,
        sdp: String,
    },
    IceCandidate {
        from: SessionId,
        candidate: IceCandidate,
    },
}

impl ServerMessage {
    pub fn transform(id: SessionId, transform: Transform) -> Self {
        ServerMessage::Transform {
            id,
            position: transform.position,
            rotation: transform.rotation,
            auxiliary: transform.auxiliary,
        }
    }

    pub fn directed(from: SessionId, payload: SignalPayload) -> Self {
        match payload {
            SignalPayload::Offer { sdp } => ServerMessage::Offer { from, sdp },
            SignalPayload::Answer { sdp } => ServerMessage::Answer { from, sdp },
            SignalPayload::IceCandidate { candidate } => {
                ServerMessage::IceCandidate { from, candidate }
            }
        }
    }

    /// Splits a handshake frame into its sender and body.
    pub fn into_directed(self) -> Result<(SessionId, SignalPayload), Self> {
        match self {
            ServerMessage::Offer { from, sdp } => Ok((from, SignalPayload::Offer { sdp })),
            ServerMessage::Answer { from, sdp } => Ok((from, SignalPayload::Answer { sdp })),
            ServerMessage::IceCandidate { from, candidate } => {
                Ok((from, SignalPayload::IceCandidate { candidate }))
            }
            other => Err(other),
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
