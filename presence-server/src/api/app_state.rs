use crate::config::{AvatarConfig, RelayConfig};
use crate::relay::RelayHandle;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayHandle,
    pub avatar: Arc<RwLock<AvatarConfig>>,
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(relay: RelayHandle, config: &RelayConfig) -> Self {
        Self {
            relay,
            avatar: Arc::new(RwLock::new(config.avatar.clone())),
            admin_token: config.admin_token.as_deref().map(Arc::from),
        }
    }
}
