use presence_core::SessionId;
use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::{EngineInner, PeerSignal, PresenceEngine};
use crate::logger::Logger;

impl PresenceEngine {
    /// Feeds a peer worker or connection callback result back into the
    /// session. Signals from a replaced worker generation are dropped.
    pub(crate) fn on_peer_signal(
        inner: &Rc<RefCell<EngineInner>>,
        remote: &SessionId,
        generation: u64,
        signal: PeerSignal,
    ) {
        let actions = {
            let mut guard = inner.borrow_mut();
            let current = guard.peers.get(remote).map(|slot| slot.generation);
            if current != Some(generation) {
                Logger::debug(&format!(
                    "Dropping stale {:?} from {} (generation {})",
                    signal, remote, generation
                ));
                return;
            }

            match signal {
                PeerSignal::LocalDescription(description) => {
                    guard.session.local_description_ready(remote, description)
                }
                PeerSignal::LocalCandidate(candidate) => {
                    guard.session.local_candidate(remote, candidate)
                }
                PeerSignal::RemoteTrack(track) => guard.session.remote_track(remote, track),
                PeerSignal::Failed(reason) => guard.session.negotiation_failed(remote, &reason),
                PeerSignal::HandshakeTimeout => guard.session.handshake_timed_out(remote),
            }
        };
        Self::execute(inner, actions);
    }
}
