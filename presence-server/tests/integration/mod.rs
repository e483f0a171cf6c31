pub mod presence_tests;
pub mod signaling_tests;
pub mod transform_tests;

use presence_server::{Relay, RelayConfig, RelayHandle, RelayServer};
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_relay() -> RelayHandle {
    create_test_relay_with(RelayConfig::default())
}

pub fn create_test_relay_with(config: RelayConfig) -> RelayHandle {
    Relay::spawn(&config)
}

/// Starts a full HTTP server on an ephemeral port. Dropping the returned
/// sender shuts it down.
pub async fn start_test_server(config: RelayConfig) -> (SocketAddr, oneshot::Sender<()>) {
    let config = RelayConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        ..config
    };
    let server = RelayServer::bind(config)
        .await
        .expect("Failed to bind test server");
    let addr = server.local_addr().expect("No local address");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(server.run(async move {
        let _ = shutdown_rx.await;
    }));

    (addr, shutdown_tx)
}
