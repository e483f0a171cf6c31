use crate::mesh::action::{CloseReason, MeshAction, MeshEvent, TrackInfo};
use crate::mesh::peer_link::{LinkState, PeerLink, Role};
use crate::mesh::tie_break::initiates;
use crate::model::{
    ClientMessage, IceCandidate, SdpKind, SessionDescription, SessionId, SignalPayload,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Per-client negotiation state for every known remote session.
///
/// Holds at most one [`PeerLink`] per remote id. Links are created lazily
/// the first time a remote id shows up (transform, join event or handshake
/// frame) and removed on departure, failure or relay loss.
#[derive(Debug)]
pub struct Negotiator {
    local_id: SessionId,
    links: HashMap<SessionId, PeerLink>,
}

impl Negotiator {
    pub fn new(local_id: SessionId) -> Self {
        Self {
            local_id,
            links: HashMap::new(),
        }
    }

    pub fn local_id(&self) -> &SessionId {
        &self.local_id
    }

    pub fn link(&self, remote: &SessionId) -> Option<&PeerLink> {
        self.links.get(remote)
    }

    pub fn links(&self) -> impl Iterator<Item = &PeerLink> {
        self.links.values()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Registers `remote` if it is new. The lower id starts the offer right
    /// away; the other side waits in `New` for it.
    pub fn discover(&mut self, remote: &SessionId) -> Vec<MeshAction> {
        if *remote == self.local_id || self.links.contains_key(remote) {
            return Vec::new();
        }

        let role = if initiates(&self.local_id, remote) {
            Role::Initiator
        } else {
            Role::Responder
        };
        info!(remote = %remote, ?role, "discovered remote session");

        let mut actions = vec![MeshAction::OpenPeer {
            remote: remote.clone(),
        }];
        let mut link = PeerLink::new(remote.clone(), role);

        if role == Role::Initiator {
            link.set_state(LinkState::Offering);
            actions.push(state_changed(remote, LinkState::Offering));
            actions.push(MeshAction::CreateOffer {
                remote: remote.clone(),
            });
        }

        self.links.insert(remote.clone(), link);
        actions
    }

    /// Handles a handshake frame relayed from `from`.
    pub fn on_signal(&mut self, from: &SessionId, payload: SignalPayload) -> Vec<MeshAction> {
        if *from == self.local_id {
            debug!("ignoring {} addressed from our own session", payload.kind());
            return Vec::new();
        }

        let mut actions = self.discover(from);
        if matches!(payload, SignalPayload::Offer { .. }) && self.superseded_by_offer(from) {
            info!(remote = %from, "fresh offer on a live link, starting over");
            actions.extend(self.close(from, CloseReason::Replaced));
            actions.extend(self.discover(from));
        }

        let Some(link) = self.links.get_mut(from) else {
            return actions;
        };

        match payload {
            SignalPayload::Offer { sdp } => {
                if link.role() != Role::Responder || link.state() != LinkState::New {
                    warn!(
                        remote = %from,
                        state = ?link.state(),
                        role = ?link.role(),
                        "ignoring unexpected offer"
                    );
                    return actions;
                }

                link.set_state(LinkState::Answering);
                actions.push(state_changed(from, LinkState::Answering));
                actions.push(MeshAction::ApplyRemoteDescription {
                    remote: from.clone(),
                    description: SessionDescription {
                        kind: SdpKind::Offer,
                        sdp,
                    },
                });
                flush_pending(link, &mut actions);
                actions.push(MeshAction::CreateAnswer {
                    remote: from.clone(),
                });
            }

            SignalPayload::Answer { sdp } => {
                if link.state() != LinkState::Offering {
                    warn!(remote = %from, state = ?link.state(), "ignoring unexpected answer");
                    return actions;
                }

                actions.push(MeshAction::ApplyRemoteDescription {
                    remote: from.clone(),
                    description: SessionDescription {
                        kind: SdpKind::Answer,
                        sdp,
                    },
                });
                flush_pending(link, &mut actions);
                link.set_state(LinkState::Connected);
                actions.push(state_changed(from, LinkState::Connected));
            }

            SignalPayload::IceCandidate { candidate } => {
                if link.remote_description_set() {
                    actions.push(MeshAction::AddIceCandidate {
                        remote: from.clone(),
                        candidate,
                    });
                } else {
                    debug!(remote = %from, "buffering early ICE candidate");
                    link.buffer_candidate(candidate);
                }
            }
        }

        actions
    }

    /// The driver finished creating and applying a local description.
    pub fn local_description_ready(
        &mut self,
        remote: &SessionId,
        description: SessionDescription,
    ) -> Vec<MeshAction> {
        let Some(link) = self.links.get_mut(remote) else {
            debug!(remote = %remote, "discarding local description for a closed link");
            return Vec::new();
        };

        match (description.kind, link.state()) {
            (SdpKind::Offer, LinkState::Offering) => {
                let mut actions = vec![MeshAction::Send(ClientMessage::directed(
                    remote.clone(),
                    SignalPayload::Offer {
                        sdp: description.sdp,
                    },
                ))];
                actions.extend(link.take_held_on_offer_sent().into_iter().map(|candidate| {
                    MeshAction::Send(ClientMessage::directed(
                        remote.clone(),
                        SignalPayload::IceCandidate { candidate },
                    ))
                }));
                actions
            }
            (SdpKind::Answer, LinkState::Answering) => {
                link.set_state(LinkState::Connected);
                vec![
                    MeshAction::Send(ClientMessage::directed(
                        remote.clone(),
                        SignalPayload::Answer {
                            sdp: description.sdp,
                        },
                    )),
                    state_changed(remote, LinkState::Connected),
                ]
            }
            (kind, state) => {
                warn!(remote = %remote, ?kind, ?state, "discarding out-of-place local description");
                Vec::new()
            }
        }
    }

    /// A local ICE candidate was gathered for `remote`.
    pub fn local_candidate(
        &mut self,
        remote: &SessionId,
        candidate: IceCandidate,
    ) -> Vec<MeshAction> {
        let Some(link) = self.links.get_mut(remote) else {
            return Vec::new();
        };
        if link.holds_local_candidates() {
            debug!(remote = %remote, "holding local candidate until the offer is sent");
            link.hold_local_candidate(candidate);
            return Vec::new();
        }
        vec![MeshAction::Send(ClientMessage::directed(
            remote.clone(),
            SignalPayload::IceCandidate { candidate },
        ))]
    }

    pub fn remote_track(&self, remote: &SessionId, track: TrackInfo) -> Vec<MeshAction> {
        if !self.links.contains_key(remote) {
            debug!(remote = %remote, "dropping track for unknown link");
            return Vec::new();
        }
        vec![MeshAction::Notify(MeshEvent::TrackReceived {
            remote: remote.clone(),
            track,
        })]
    }

    /// Closes the link after an ICE/SDP failure. No retry is scheduled; the
    /// next discovery of `remote` starts over from `New`.
    pub fn negotiation_failed(&mut self, remote: &SessionId, reason: &str) -> Vec<MeshAction> {
        if self.links.contains_key(remote) {
            warn!(remote = %remote, reason, "negotiation failed, closing link");
        }
        self.close(remote, CloseReason::Failed)
    }

    /// The driver's handshake deadline for `remote` passed. Links that made
    /// it to `Connected` are left alone; anything else is dropped so the
    /// next discovery starts a fresh attempt.
    pub fn handshake_timed_out(&mut self, remote: &SessionId) -> Vec<MeshAction> {
        match self.links.get(remote).map(PeerLink::state) {
            Some(LinkState::Connected) | None => Vec::new(),
            Some(state) => {
                warn!(remote = %remote, ?state, "handshake timed out");
                self.close(remote, CloseReason::TimedOut)
            }
        }
    }

    /// Departure of `remote`. Safe to call repeatedly and in any state.
    pub fn depart(&mut self, remote: &SessionId) -> Vec<MeshAction> {
        self.close(remote, CloseReason::Departed)
    }

    /// Drops every link after the relay connection went away.
    pub fn reset(&mut self) -> Vec<MeshAction> {
        let mut remotes: Vec<SessionId> = self.links.keys().cloned().collect();
        remotes.sort();
        remotes
            .iter()
            .flat_map(|remote| self.close(remote, CloseReason::RelayLost))
            .collect()
    }

    /// An offer from the initiator means it has given up on whatever we
    /// hold for it, so anything past `New` is stale.
    fn superseded_by_offer(&self, from: &SessionId) -> bool {
        self.links
            .get(from)
            .is_some_and(|link| link.role() == Role::Responder && link.state() != LinkState::New)
    }

    fn close(&mut self, remote: &SessionId, reason: CloseReason) -> Vec<MeshAction> {
        let Some(mut link) = self.links.remove(remote) else {
            return Vec::new();
        };
        info!(remote = %remote, from = ?link.state(), ?reason, "closing peer link");
        link.set_state(LinkState::Closed);

        vec![
            MeshAction::ClosePeer {
                remote: remote.clone(),
            },
            MeshAction::Notify(MeshEvent::PeerClosed {
                remote: remote.clone(),
                reason,
            }),
        ]
    }
}

fn flush_pending(link: &mut PeerLink, actions: &mut Vec<MeshAction>) {
    let remote = link.remote_id().clone();
    for candidate in link.take_pending_on_remote_description() {
        actions.push(MeshAction::AddIceCandidate {
            remote: remote.clone(),
            candidate,
        });
    }
}

fn state_changed(remote: &SessionId, state: LinkState) -> MeshAction {
    MeshAction::Notify(MeshEvent::PeerStateChanged {
        remote: remote.clone(),
        state,
    })
}
