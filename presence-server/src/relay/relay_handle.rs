use crate::relay::relay_command::RelayCommand;
use presence_core::{ServerMessage, SessionId, SignalPayload, Transform};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay event loop is no longer running")]
    Closed,
}

/// Cloneable sender side of the relay loop.
#[derive(Clone)]
pub struct RelayHandle {
    command_tx: mpsc::Sender<RelayCommand>,
    live_count_rx: watch::Receiver<usize>,
}

impl RelayHandle {
    pub fn new(command_tx: mpsc::Sender<RelayCommand>, live_count_rx: watch::Receiver<usize>) -> Self {
        Self {
            command_tx,
            live_count_rx,
        }
    }

    /// Registers a new session whose outgoing frames go to `outbox`.
    pub async fn connect(
        &self,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<SessionId, RelayError> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(RelayCommand::Connect { outbox, reply }).await?;
        reply_rx.await.map_err(|_| RelayError::Closed)
    }

    pub async fn transform(
        &self,
        session_id: SessionId,
        transform: Transform,
    ) -> Result<(), RelayError> {
        self.send(RelayCommand::Transform {
            session_id,
            transform,
        })
        .await
    }

    pub async fn signal(
        &self,
        from: SessionId,
        to: SessionId,
        payload: SignalPayload,
    ) -> Result<(), RelayError> {
        self.send(RelayCommand::Signal { from, to, payload }).await
    }

    pub async fn disconnect(&self, session_id: SessionId) -> Result<(), RelayError> {
        self.send(RelayCommand::Disconnect { session_id }).await
    }

    /// Number of sessions registered as of the last relay update.
    pub fn live_count(&self) -> usize {
        *self.live_count_rx.borrow()
    }

    pub fn subscribe_live_count(&self) -> watch::Receiver<usize> {
        self.live_count_rx.clone()
    }

    async fn send(&self, cmd: RelayCommand) -> Result<(), RelayError> {
        self.command_tx.send(cmd).await.map_err(|_| RelayError::Closed)
    }
}
