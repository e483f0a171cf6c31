use presence_core::{ServerMessage, SessionId, Transform};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::debug;

/// Per-connection state owned by the relay task.
pub struct Session {
    pub id: SessionId,
    pub connected_at: Instant,
    pub last_transform: Option<Transform>,
    outbox: mpsc::UnboundedSender<ServerMessage>,
}

/// Connected sessions keyed by their relay-assigned id.
///
/// Only the relay event loop touches this, so there is no interior locking.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh id and registers the session's outbox under it.
    pub fn insert(&mut self, outbox: mpsc::UnboundedSender<ServerMessage>) -> SessionId {
        let mut id = SessionId::generate();
        while self.sessions.contains_key(&id) {
            id = SessionId::generate();
        }

        self.sessions.insert(
            id.clone(),
            Session {
                id: id.clone(),
                connected_at: Instant::now(),
                last_transform: None,
                outbox,
            },
        );
        id
    }

    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &SessionId> {
        self.sessions.keys()
    }

    pub fn last_transform(&self, id: &SessionId) -> Option<&Transform> {
        self.sessions.get(id)?.last_transform.as_ref()
    }

    /// Stores the latest transform. Returns `false` if `id` is not registered.
    pub fn update_transform(&mut self, id: &SessionId, transform: Transform) -> bool {
        match self.sessions.get_mut(id) {
            Some(session) => {
                session.last_transform = Some(transform);
                true
            }
            None => false,
        }
    }

    /// Last transform of every session except `except`.
    pub fn snapshot_except(&self, except: &SessionId) -> Vec<(SessionId, Transform)> {
        self.sessions
            .values()
            .filter(|s| s.id != *except)
            .filter_map(|s| Some((s.id.clone(), s.last_transform.clone()?)))
            .collect()
    }

    /// Queues `msg` for one session. Returns `false` if the session is
    /// unknown or its socket is already gone.
    pub fn deliver(&self, to: &SessionId, msg: ServerMessage) -> bool {
        let Some(session) = self.sessions.get(to) else {
            return false;
        };
        if session.outbox.send(msg).is_err() {
            debug!(session = %to, "outbox closed, socket already gone");
            return false;
        }
        true
    }

    /// Queues `msg` for every session except `except` (if given). Returns
    /// the number of sessions it was queued for.
    pub fn broadcast(&self, msg: &ServerMessage, except: Option<&SessionId>) -> usize {
        let mut delivered = 0;
        for session in self.sessions.values() {
            if Some(&session.id) == except {
                continue;
            }
            if session.outbox.send(msg.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(session = %session.id, "outbox closed, socket already gone");
            }
        }
        delivered
    }
}
