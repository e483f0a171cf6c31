use presence_core::utils::default_ice_servers;
use presence_core::{IceServerConfig, Vec3};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Who receives a relayed transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EchoPolicy {
    /// Every session, sender included. Clients must drop frames carrying
    /// their own id.
    #[default]
    IncludeSender,
    /// Every session except the sender.
    ExcludeSender,
}

/// Default avatar geometry handed to clients at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarConfig {
    pub model_url: String,
    pub scale: f64,
    #[serde(default)]
    pub spawn_position: Vec3,
    #[serde(default)]
    pub spawn_rotation: Vec3,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            model_url: "/models/avatar.glb".to_owned(),
            scale: 1.0,
            spawn_position: Vec3::ZERO,
            spawn_rotation: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub ice_servers: Vec<IceServerConfig>,
    pub echo_policy: EchoPolicy,
    /// Send a newcomer the last known transform of every session right
    /// after `Welcome` instead of waiting for the next periodic update.
    pub snapshot_on_join: bool,
    /// Bearer token for configuration writes. `None` disables writes.
    pub admin_token: Option<String>,
    pub command_buffer: usize,
    pub avatar: AvatarConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ice_servers: default_ice_servers(),
            echo_policy: EchoPolicy::default(),
            snapshot_on_join: false,
            admin_token: None,
            command_buffer: 256,
            avatar: AvatarConfig::default(),
        }
    }
}
