use crate::client::RelayConnection;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::peer::{PeerWorker, PeerWorkerHandle};
use crate::transport::{PeerEvent, PeerEventSink, PeerSignal, TransportFactory};
use presence_core::mesh::{MeshAction, MeshEvent, MeshSession};
use presence_core::{SessionId, Transform};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Native driver for a [`MeshSession`].
///
/// One task (the caller of [`MeshClient::run`]) owns the session and the
/// relay socket. Every peer gets its own [`PeerWorker`], and the local pose is
/// published from a `watch` channel on a fixed tick.
pub struct MeshClient {
    config: ClientConfig,
    connection: RelayConnection,
    factory: Arc<dyn TransportFactory>,
    session: MeshSession,
    workers: HashMap<SessionId, PeerWorkerHandle>,
    next_generation: u64,
    pose_rx: watch::Receiver<Transform>,
    peer_tx: mpsc::UnboundedSender<PeerEvent>,
    peer_rx: mpsc::UnboundedReceiver<PeerEvent>,
    events_tx: mpsc::UnboundedSender<MeshEvent>,
}

impl MeshClient {
    /// Opens the relay socket. Application events are delivered on the
    /// returned receiver once [`MeshClient::run`] is polled.
    pub async fn connect(
        config: ClientConfig,
        factory: Arc<dyn TransportFactory>,
        pose_rx: watch::Receiver<Transform>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MeshEvent>), ClientError> {
        let connection = RelayConnection::connect(&config.url).await?;
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let client = Self {
            config,
            connection,
            factory,
            session: MeshSession::new(),
            workers: HashMap::new(),
            next_generation: 0,
            pose_rx,
            peer_tx,
            peer_rx,
            events_tx,
        };
        Ok((client, events_rx))
    }

    /// Drives the session until `shutdown` resolves or the relay goes away.
    /// Either way every peer link is torn down before this returns.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), ClientError>
    where
        F: Future<Output = ()>,
    {
        if let Err(e) = self.factory.prepare_media().await {
            let actions = self.session.media_unavailable(format!("{e:#}"));
            self.execute(actions).await?;
        }

        let mut ticker = tokio::time::interval(self.config.transform_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, leaving relay");
                    break Ok(());
                }

                frame = self.connection.recv() => match frame {
                    Some(Ok(msg)) => {
                        let actions = self.session.handle_server_message(msg);
                        if let Err(e) = self.execute(actions).await {
                            break Err(e);
                        }
                    }
                    Some(Err(e)) => break Err(e),
                    None => {
                        warn!("Relay closed the connection");
                        break Err(ClientError::RelayClosed);
                    }
                },

                Some(event) = self.peer_rx.recv() => {
                    let actions = self.on_peer_event(event);
                    if let Err(e) = self.execute(actions).await {
                        break Err(e);
                    }
                }

                _ = ticker.tick() => {
                    if self.session.local_id().is_none() {
                        continue;
                    }
                    let pose = self.pose_rx.borrow().clone();
                    let msg = self.session.outgoing_transform(pose);
                    if let Err(e) = self.connection.send(&msg).await {
                        break Err(e);
                    }
                }
            }
        };

        let actions = self.session.connection_lost();
        for action in actions {
            self.apply_local(action);
        }
        self.connection.close().await;

        result
    }

    fn on_peer_event(&mut self, event: PeerEvent) -> Vec<MeshAction> {
        let current = self.workers.get(&event.remote).map(PeerWorkerHandle::generation);
        if current != Some(event.generation) {
            debug!(
                "Dropping stale {:?} from {} (generation {})",
                event.signal, event.remote, event.generation
            );
            return Vec::new();
        }

        match event.signal {
            PeerSignal::LocalDescription(description) => self
                .session
                .local_description_ready(&event.remote, description),
            PeerSignal::LocalCandidate(candidate) => {
                self.session.local_candidate(&event.remote, candidate)
            }
            PeerSignal::RemoteTrack(track) => self.session.remote_track(&event.remote, track),
            PeerSignal::Failed(reason) => self.session.negotiation_failed(&event.remote, &reason),
            PeerSignal::HandshakeTimeout => self.session.handshake_timed_out(&event.remote),
        }
    }

    async fn execute(&mut self, actions: Vec<MeshAction>) -> Result<(), ClientError> {
        for action in actions {
            if let MeshAction::Send(msg) = action {
                self.connection.send(&msg).await?;
            } else {
                self.apply_local(action);
            }
        }
        Ok(())
    }

    /// Runs everything except relay sends: notifications and peer work.
    fn apply_local(&mut self, action: MeshAction) {
        match action {
            MeshAction::Notify(event) => {
                let _ = self.events_tx.send(event);
            }
            MeshAction::Send(msg) => {
                debug!("Dropping relay frame after disconnect: {:?}", msg);
            }
            MeshAction::OpenPeer { remote } => {
                let generation = self.next_generation;
                self.next_generation += 1;

                let ice_servers = self
                    .session
                    .ice_servers()
                    .map(<[_]>::to_vec)
                    .unwrap_or_else(|| self.config.fallback_ice_servers.clone());
                let sink = PeerEventSink::new(remote.clone(), generation, self.peer_tx.clone());
                let worker = PeerWorker::spawn(
                    remote.clone(),
                    generation,
                    self.factory.clone(),
                    ice_servers,
                    self.config.handshake_timeout,
                    sink,
                );
                worker.push(MeshAction::OpenPeer {
                    remote: remote.clone(),
                });
                if let Some(old) = self.workers.insert(remote, worker) {
                    old.close();
                }
            }
            MeshAction::ClosePeer { remote } => {
                if let Some(worker) = self.workers.remove(&remote) {
                    worker.close();
                }
            }
            action => {
                let Some(remote) = action.remote().cloned() else {
                    return;
                };
                match self.workers.get(&remote) {
                    Some(worker) => {
                        worker.push(action);
                    }
                    None => debug!("No worker for {}, dropping action", remote),
                }
            }
        }
    }
}
