use anyhow::{Context, Result, bail};
use presence_core::{ServerMessage, SessionId};
use presence_server::RelayHandle;
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for a single expected frame (ms).
pub const RECV_TIMEOUT_MS: u64 = 2000;

/// How long a session must stay quiet to count as "received nothing" (ms).
pub const SILENCE_MS: u64 = 150;

/// A session registered straight with the relay actor, bypassing WebSocket.
/// Its outbox receiver stands in for the socket writer.
pub struct MockSession {
    pub id: SessionId,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl MockSession {
    pub async fn connect(relay: &RelayHandle) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = relay.connect(tx).await.context("Relay refused connect")?;
        Ok(Self { id, rx })
    }

    /// Connects and consumes `IceConfig` + `Welcome`, checking both.
    pub async fn join(relay: &RelayHandle) -> Result<Self> {
        let mut session = Self::connect(relay).await?;

        match session.recv().await? {
            ServerMessage::IceConfig { .. } => {}
            other => bail!("Expected IceConfig first, got {:?}", other),
        }
        match session.recv().await? {
            ServerMessage::Welcome { session_id } if session_id == session.id => {}
            other => bail!("Expected Welcome for {}, got {:?}", session.id, other),
        }
        Ok(session)
    }

    pub async fn recv(&mut self) -> Result<ServerMessage> {
        let msg = tokio::time::timeout(Duration::from_millis(RECV_TIMEOUT_MS), self.rx.recv())
            .await
            .with_context(|| format!("Timeout waiting for frame on {}", self.id))?;
        msg.context("Outbox closed")
    }

    /// Skips frames until one matches `pred`.
    pub async fn recv_until<F>(&mut self, mut pred: F) -> Result<ServerMessage>
    where
        F: FnMut(&ServerMessage) -> bool,
    {
        loop {
            let msg = self.recv().await?;
            if pred(&msg) {
                return Ok(msg);
            }
        }
    }

    /// Everything queued right now, without waiting.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Waits briefly and returns whatever arrived in that window.
    pub async fn settle(&mut self) -> Vec<ServerMessage> {
        tokio::time::sleep(Duration::from_millis(SILENCE_MS)).await;
        self.drain()
    }
}

pub fn is_transform_from(msg: &ServerMessage, from: &SessionId) -> bool {
    matches!(msg, ServerMessage::Transform { id, .. } if id == from)
}

pub fn is_departed(msg: &ServerMessage, who: &SessionId) -> bool {
    matches!(msg, ServerMessage::Departed { id } if id == who)
}
