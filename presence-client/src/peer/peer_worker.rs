use crate::transport::{PeerEventSink, PeerSignal, PeerTransport, TransportFactory};
use anyhow::{Context, Result, anyhow};
use presence_core::mesh::MeshAction;
use presence_core::{IceServerConfig, SdpKind, SessionDescription, SessionId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sender side of a running [`PeerWorker`]. Dropping the handle releases the
/// worker's transport without waiting for queued or in-flight actions.
pub struct PeerWorkerHandle {
    generation: u64,
    tx: mpsc::UnboundedSender<MeshAction>,
    cancel: CancellationToken,
}

impl PeerWorkerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queues an action behind everything already sent to this worker.
    pub fn push(&self, action: MeshAction) -> bool {
        self.tx.send(action).is_ok()
    }

    /// Interrupts whatever the worker is awaiting and closes its transport.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for PeerWorkerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Owns one peer's transport and runs that peer's actions strictly in
/// order, so a slow handshake never holds up other peers or the client loop.
pub struct PeerWorker {
    remote: SessionId,
    factory: Arc<dyn TransportFactory>,
    ice_servers: Vec<IceServerConfig>,
    events: PeerEventSink,
    actions_rx: mpsc::UnboundedReceiver<MeshAction>,
    transport: Option<Box<dyn PeerTransport>>,
    failed: bool,
    cancel: CancellationToken,
}

impl PeerWorker {
    pub fn spawn(
        remote: SessionId,
        generation: u64,
        factory: Arc<dyn TransportFactory>,
        ice_servers: Vec<IceServerConfig>,
        handshake_timeout: Duration,
        events: PeerEventSink,
    ) -> PeerWorkerHandle {
        let (tx, actions_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let deadline_cancel = cancel.clone();
        let deadline_events = events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = deadline_cancel.cancelled() => {}
                _ = tokio::time::sleep(handshake_timeout) => {
                    deadline_events.emit(PeerSignal::HandshakeTimeout);
                }
            }
        });

        let worker = PeerWorker {
            remote,
            factory,
            ice_servers,
            events,
            actions_rx,
            transport: None,
            failed: false,
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run());

        PeerWorkerHandle {
            generation,
            tx,
            cancel,
        }
    }

    async fn run(mut self) {
        debug!("Peer worker for {} started", self.remote);
        let cancel = self.cancel.clone();

        loop {
            let action = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                action = self.actions_rx.recv() => match action {
                    Some(action) => action,
                    None => break,
                },
            };
            if self.failed {
                continue;
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.execute(action) => result,
            };
            if let Err(e) = result {
                warn!("Negotiation with {} failed: {:#}", self.remote, e);
                self.failed = true;
                self.events.emit(PeerSignal::Failed(format!("{e:#}")));
            }
        }

        self.shutdown().await;
        debug!("Peer worker for {} finished", self.remote);
    }

    async fn execute(&mut self, action: MeshAction) -> Result<()> {
        match action {
            MeshAction::OpenPeer { .. } => {
                let transport = self
                    .factory
                    .open(&self.ice_servers, self.events.clone())
                    .await
                    .context("Failed to open peer transport")?;
                self.transport = Some(transport);
            }

            MeshAction::CreateOffer { .. } => {
                let sdp = self.transport()?.create_offer().await?;
                self.events
                    .emit(PeerSignal::LocalDescription(SessionDescription {
                        kind: SdpKind::Offer,
                        sdp,
                    }));
            }

            MeshAction::CreateAnswer { .. } => {
                let sdp = self.transport()?.create_answer().await?;
                self.events
                    .emit(PeerSignal::LocalDescription(SessionDescription {
                        kind: SdpKind::Answer,
                        sdp,
                    }));
            }

            MeshAction::ApplyRemoteDescription { description, .. } => {
                self.transport()?
                    .set_remote_description(description)
                    .await
                    .context("Failed to apply remote description")?;
            }

            MeshAction::AddIceCandidate { candidate, .. } => {
                // A single bad candidate does not doom the link.
                if let Err(e) = self.transport()?.add_ice_candidate(candidate).await {
                    warn!("Failed to add ICE candidate for {}: {:#}", self.remote, e);
                }
            }

            MeshAction::ClosePeer { .. } | MeshAction::Send(_) | MeshAction::Notify(_) => {
                debug!("Ignoring non-peer action in worker for {}", self.remote);
            }
        }

        Ok(())
    }

    fn transport(&self) -> Result<&dyn PeerTransport> {
        self.transport
            .as_deref()
            .ok_or_else(|| anyhow!("no transport open for {}", self.remote))
    }

    async fn shutdown(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };
        if let Err(e) = transport.close().await {
            warn!("Failed to close transport for {}: {:#}", self.remote, e);
        }
        info!("Peer link to {} torn down", self.remote);
    }
}
