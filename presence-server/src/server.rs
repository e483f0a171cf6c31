use crate::api::{AppState, build_router};
use crate::config::RelayConfig;
use crate::relay::{Relay, RelayHandle};
use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Bound listener plus the running relay loop behind it.
pub struct RelayServer {
    listener: TcpListener,
    state: AppState,
}

impl RelayServer {
    /// Binds `config.bind_addr` and starts the relay loop. Use port 0 to let
    /// the OS pick one; [`RelayServer::local_addr`] reports the result.
    pub async fn bind(config: RelayConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

        let relay = Relay::spawn(&config);
        let state = AppState::new(relay, &config);

        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Listener has no local address")
    }

    pub fn relay(&self) -> RelayHandle {
        self.state.relay.clone()
    }

    /// Serves until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        let app = build_router(self.state);

        info!("Presence relay listening on http://{}", addr);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server error")?;

        info!("Presence relay stopped");
        Ok(())
    }
}
