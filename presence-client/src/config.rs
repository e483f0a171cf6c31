use presence_core::IceServerConfig;
use presence_core::utils::{HANDSHAKE_TIMEOUT_MS, TRANSFORM_TICK_MS, default_ice_servers};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay, e.g. `ws://127.0.0.1:3000/ws`.
    pub url: String,
    pub transform_tick: Duration,
    /// Used until the relay's `IceConfig` arrives.
    pub fallback_ice_servers: Vec<IceServerConfig>,
    /// A peer link still short of `Connected` after this long is dropped and
    /// renegotiated on the next discovery.
    pub handshake_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:3000/ws".to_owned(),
            transform_tick: Duration::from_millis(TRANSFORM_TICK_MS),
            fallback_ice_servers: default_ice_servers(),
            handshake_timeout: Duration::from_millis(HANDSHAKE_TIMEOUT_MS),
        }
    }
}
