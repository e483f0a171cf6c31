use crate::mesh::action::{MeshAction, MeshEvent, TrackInfo};
use crate::mesh::negotiator::Negotiator;
use crate::mesh::roster::Roster;
use crate::model::{
    ClientMessage, IceCandidate, IceServerConfig, ServerMessage, SessionDescription, SessionId,
    Transform,
};
use tracing::{debug, info, warn};

/// Client-side state for one relay connection: remote avatars, live count
/// and the peer negotiator.
///
/// The relay echoes transforms back to their sender, so every transform is
/// checked against the local id before it touches the roster.
#[derive(Debug, Default)]
pub struct MeshSession {
    negotiator: Option<Negotiator>,
    roster: Roster,
    live_count: usize,
    ice_servers: Option<Vec<IceServerConfig>>,
}

impl MeshSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_id(&self) -> Option<&SessionId> {
        self.negotiator.as_ref().map(Negotiator::local_id)
    }

    pub fn negotiator(&self) -> Option<&Negotiator> {
        self.negotiator.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    pub fn ice_servers(&self) -> Option<&[IceServerConfig]> {
        self.ice_servers.as_deref()
    }

    pub fn outgoing_transform(&self, transform: Transform) -> ClientMessage {
        ClientMessage::Transform(transform)
    }

    pub fn handle_server_message(&mut self, msg: ServerMessage) -> Vec<MeshAction> {
        let msg = match msg.into_directed() {
            Ok((from, payload)) => {
                return match self.negotiator.as_mut() {
                    Some(negotiator) => negotiator.on_signal(&from, payload),
                    None => {
                        debug!("handshake frame before welcome, dropping");
                        Vec::new()
                    }
                };
            }
            Err(other) => other,
        };

        match msg {
            ServerMessage::IceConfig { ice_servers } => {
                info!("received ICE config: {} servers", ice_servers.len());
                self.ice_servers = Some(ice_servers);
                Vec::new()
            }

            ServerMessage::Welcome { session_id } => self.welcome(session_id),

            ServerMessage::Transform {
                id,
                position,
                rotation,
                auxiliary,
            } => {
                let Some(negotiator) = self.negotiator.as_mut() else {
                    return Vec::new();
                };
                if id == *negotiator.local_id() {
                    return Vec::new();
                }

                let transform = Transform {
                    position,
                    rotation,
                    auxiliary,
                };
                let mut actions = negotiator.discover(&id);
                self.roster.upsert(id.clone(), transform.clone());
                actions.push(MeshAction::Notify(MeshEvent::AvatarUpdated { id, transform }));
                actions
            }

            ServerMessage::Joined { id } => match self.negotiator.as_mut() {
                Some(negotiator) => negotiator.discover(&id),
                None => Vec::new(),
            },

            ServerMessage::Departed { id } => {
                let mut actions = Vec::new();
                if self.roster.remove(&id).is_some() {
                    actions.push(MeshAction::Notify(MeshEvent::AvatarRemoved { id: id.clone() }));
                }
                if let Some(negotiator) = self.negotiator.as_mut() {
                    actions.extend(negotiator.depart(&id));
                }
                actions
            }

            ServerMessage::LiveCount { count } => {
                self.live_count = count;
                vec![MeshAction::Notify(MeshEvent::LiveCount { count })]
            }

            ServerMessage::Offer { .. }
            | ServerMessage::Answer { .. }
            | ServerMessage::IceCandidate { .. } => Vec::new(),
        }
    }

    pub fn local_description_ready(
        &mut self,
        remote: &SessionId,
        description: SessionDescription,
    ) -> Vec<MeshAction> {
        self.negotiator
            .as_mut()
            .map(|n| n.local_description_ready(remote, description))
            .unwrap_or_default()
    }

    pub fn local_candidate(
        &mut self,
        remote: &SessionId,
        candidate: IceCandidate,
    ) -> Vec<MeshAction> {
        self.negotiator
            .as_mut()
            .map(|n| n.local_candidate(remote, candidate))
            .unwrap_or_default()
    }

    pub fn remote_track(&self, remote: &SessionId, track: TrackInfo) -> Vec<MeshAction> {
        self.negotiator
            .as_ref()
            .map(|n| n.remote_track(remote, track))
            .unwrap_or_default()
    }

    pub fn negotiation_failed(&mut self, remote: &SessionId, reason: &str) -> Vec<MeshAction> {
        self.negotiator
            .as_mut()
            .map(|n| n.negotiation_failed(remote, reason))
            .unwrap_or_default()
    }

    pub fn handshake_timed_out(&mut self, remote: &SessionId) -> Vec<MeshAction> {
        self.negotiator
            .as_mut()
            .map(|n| n.handshake_timed_out(remote))
            .unwrap_or_default()
    }

    /// Camera or microphone could not be opened. Links keep negotiating with
    /// no outgoing tracks.
    pub fn media_unavailable(&self, reason: impl Into<String>) -> Vec<MeshAction> {
        let reason = reason.into();
        warn!(%reason, "local media unavailable, continuing receive-only");
        vec![MeshAction::Notify(MeshEvent::MediaUnavailable { reason })]
    }

    /// The relay connection is gone: every avatar and link goes with it.
    pub fn connection_lost(&mut self) -> Vec<MeshAction> {
        let mut actions = Vec::new();
        if let Some(mut negotiator) = self.negotiator.take() {
            actions.extend(negotiator.reset());
        }

        let mut gone: Vec<SessionId> = self.roster.ids().cloned().collect();
        gone.sort();
        self.roster.clear();
        actions.extend(
            gone.into_iter()
                .map(|id| MeshAction::Notify(MeshEvent::AvatarRemoved { id })),
        );

        self.live_count = 0;
        actions
    }

    fn welcome(&mut self, session_id: SessionId) -> Vec<MeshAction> {
        let mut actions = Vec::new();
        if let Some(current) = self.local_id().cloned() {
            if current == session_id {
                return actions;
            }
            warn!(old = %current, new = %session_id, "re-welcomed with a new session id");
            actions.extend(self.connection_lost());
        }

        info!(session = %session_id, "joined relay");
        self.negotiator = Some(Negotiator::new(session_id.clone()));
        actions.push(MeshAction::Notify(MeshEvent::Welcomed { session_id }));
        actions
    }
}
