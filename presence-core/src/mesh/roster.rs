use crate::model::{SessionId, Transform};
use std::collections::HashMap;

/// Last known transform of every remote avatar. Never contains the local
/// session.
#[derive(Debug, Default)]
pub struct Roster {
    avatars: HashMap<SessionId, Transform>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the stored transform. Returns `true` when `id` was not
    /// known before.
    pub fn upsert(&mut self, id: SessionId, transform: Transform) -> bool {
        self.avatars.insert(id, transform).is_none()
    }

    pub fn remove(&mut self, id: &SessionId) -> Option<Transform> {
        self.avatars.remove(id)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Transform> {
        self.avatars.get(id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.avatars.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SessionId> {
        self.avatars.keys()
    }

    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }

    pub fn clear(&mut self) {
        self.avatars.clear();
    }
}
