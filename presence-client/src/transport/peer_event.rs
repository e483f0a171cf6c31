use presence_core::mesh::TrackInfo;
use presence_core::{IceCandidate, SessionDescription, SessionId};
use tokio::sync::mpsc;

/// What a peer worker or its transport reports back to the client loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerSignal {
    LocalDescription(SessionDescription),
    LocalCandidate(IceCandidate),
    RemoteTrack(TrackInfo),
    Failed(String),
    /// The link's handshake deadline passed.
    HandshakeTimeout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeerEvent {
    pub remote: SessionId,
    /// Worker generation the event belongs to. Events from a worker that has
    /// since been replaced are stale and get dropped.
    pub generation: u64,
    pub signal: PeerSignal,
}

/// Sender tagged with the peer and worker generation it reports for.
#[derive(Debug, Clone)]
pub struct PeerEventSink {
    remote: SessionId,
    generation: u64,
    tx: mpsc::UnboundedSender<PeerEvent>,
}

impl PeerEventSink {
    pub fn new(remote: SessionId, generation: u64, tx: mpsc::UnboundedSender<PeerEvent>) -> Self {
        Self {
            remote,
            generation,
            tx,
        }
    }

    pub fn remote(&self) -> &SessionId {
        &self.remote
    }

    /// Returns `false` once the client loop is gone.
    pub fn emit(&self, signal: PeerSignal) -> bool {
        self.tx
            .send(PeerEvent {
                remote: self.remote.clone(),
                generation: self.generation,
                signal,
            })
            .is_ok()
    }
}
