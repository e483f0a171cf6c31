use crate::model::{IceCandidate, SessionId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    New,
    Offering,
    Answering,
    Connected,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Local view of the connection to one remote session.
#[derive(Debug)]
pub struct PeerLink {
    remote_id: SessionId,
    role: Role,
    state: LinkState,
    remote_description_set: bool,
    pending_candidates: Vec<IceCandidate>,
    offer_sent: bool,
    held_local_candidates: Vec<IceCandidate>,
}

impl PeerLink {
    pub(crate) fn new(remote_id: SessionId, role: Role) -> Self {
        Self {
            remote_id,
            role,
            state: LinkState::New,
            remote_description_set: false,
            pending_candidates: Vec::new(),
            offer_sent: false,
            held_local_candidates: Vec::new(),
        }
    }

    pub fn remote_id(&self) -> &SessionId {
        &self.remote_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn remote_description_set(&self) -> bool {
        self.remote_description_set
    }

    pub fn pending_candidates(&self) -> &[IceCandidate] {
        &self.pending_candidates
    }

    pub(crate) fn set_state(&mut self, state: LinkState) {
        self.state = state;
    }

    pub(crate) fn buffer_candidate(&mut self, candidate: IceCandidate) {
        self.pending_candidates.push(candidate);
    }

    /// Local candidates may not go out ahead of our own offer, otherwise a
    /// responder still holding the previous link would apply them to it.
    pub(crate) fn holds_local_candidates(&self) -> bool {
        self.role == Role::Initiator && !self.offer_sent
    }

    pub(crate) fn hold_local_candidate(&mut self, candidate: IceCandidate) {
        self.held_local_candidates.push(candidate);
    }

    pub(crate) fn take_held_on_offer_sent(&mut self) -> Vec<IceCandidate> {
        self.offer_sent = true;
        std::mem::take(&mut self.held_local_candidates)
    }

    /// Marks the remote description as applied and hands back the buffered
    /// candidates in arrival order.
    pub(crate) fn take_pending_on_remote_description(&mut self) -> Vec<IceCandidate> {
        self.remote_description_set = true;
        std::mem::take(&mut self.pending_candidates)
    }
}
