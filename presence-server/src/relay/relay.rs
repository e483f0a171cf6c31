use crate::config::{EchoPolicy, RelayConfig};
use crate::registry::SessionRegistry;
use crate::relay::relay_command::RelayCommand;
use crate::relay::relay_handle::RelayHandle;
use presence_core::{IceServerConfig, ServerMessage, SessionId, SignalPayload, Transform};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Single-task owner of every connected session.
///
/// All registry mutations and every fan-out happen inside [`Relay::run`], so
/// joins, departures and relayed frames reach each recipient in the order the
/// relay processed them.
pub struct Relay {
    registry: SessionRegistry,
    command_rx: mpsc::Receiver<RelayCommand>,
    live_count_tx: watch::Sender<usize>,
    ice_servers: Vec<IceServerConfig>,
    echo_policy: EchoPolicy,
    snapshot_on_join: bool,
}

impl Relay {
    pub fn new(
        command_rx: mpsc::Receiver<RelayCommand>,
        live_count_tx: watch::Sender<usize>,
        config: &RelayConfig,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            command_rx,
            live_count_tx,
            ice_servers: config.ice_servers.clone(),
            echo_policy: config.echo_policy,
            snapshot_on_join: config.snapshot_on_join,
        }
    }

    /// Starts the relay loop on the current runtime and returns a handle to it.
    pub fn spawn(config: &RelayConfig) -> RelayHandle {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (live_count_tx, live_count_rx) = watch::channel(0);

        let relay = Relay::new(command_rx, live_count_tx, config);
        tokio::spawn(relay.run());

        RelayHandle::new(command_tx, live_count_rx)
    }

    pub async fn run(mut self) {
        info!("Relay event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }

        info!("Command channel closed. Relay event loop finished");
    }

    fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Connect { outbox, reply } => {
                let session_id = self.connect(outbox);
                if reply.send(session_id.clone()).is_err() {
                    warn!(session = %session_id, "socket task gone before connect reply");
                    self.disconnect(&session_id);
                }
            }

            RelayCommand::Transform {
                session_id,
                transform,
            } => self.relay_transform(session_id, transform),

            RelayCommand::Signal { from, to, payload } => self.route_signal(from, to, payload),

            RelayCommand::Disconnect { session_id } => self.disconnect(&session_id),
        }
    }

    fn connect(&mut self, outbox: mpsc::UnboundedSender<ServerMessage>) -> SessionId {
        let session_id = self.registry.insert(outbox);
        info!(session = %session_id, live = self.registry.len(), "Session connected");

        self.registry.deliver(
            &session_id,
            ServerMessage::IceConfig {
                ice_servers: self.ice_servers.clone(),
            },
        );
        self.registry.deliver(
            &session_id,
            ServerMessage::Welcome {
                session_id: session_id.clone(),
            },
        );

        if self.snapshot_on_join {
            for (id, transform) in self.registry.snapshot_except(&session_id) {
                self.registry
                    .deliver(&session_id, ServerMessage::transform(id, transform));
            }
        }

        self.registry.broadcast(
            &ServerMessage::Joined {
                id: session_id.clone(),
            },
            Some(&session_id),
        );
        self.publish_live_count();

        session_id
    }

    fn disconnect(&mut self, session_id: &SessionId) {
        if self.registry.remove(session_id).is_none() {
            debug!(session = %session_id, "Disconnect for unknown session ignored");
            return;
        }
        info!(session = %session_id, live = self.registry.len(), "Session departed");

        self.registry.broadcast(
            &ServerMessage::Departed {
                id: session_id.clone(),
            },
            None,
        );
        self.publish_live_count();
    }

    fn relay_transform(&mut self, session_id: SessionId, transform: Transform) {
        if !self.registry.update_transform(&session_id, transform.clone()) {
            debug!(session = %session_id, "Transform from unregistered session dropped");
            return;
        }

        let except = match self.echo_policy {
            EchoPolicy::IncludeSender => None,
            EchoPolicy::ExcludeSender => Some(&session_id),
        };
        let msg = ServerMessage::transform(session_id.clone(), transform);
        self.registry.broadcast(&msg, except);
    }

    fn route_signal(&mut self, from: SessionId, to: SessionId, payload: SignalPayload) {
        if !self.registry.contains(&from) {
            debug!(session = %from, "Signal from unregistered session dropped");
            return;
        }

        let kind = payload.kind();
        if !self
            .registry
            .deliver(&to, ServerMessage::directed(from.clone(), payload))
        {
            debug!(from = %from, to = %to, kind, "Signal recipient not connected, dropped");
            return;
        }
        debug!(from = %from, to = %to, kind, "Signal forwarded");
    }

    fn publish_live_count(&mut self) {
        let count = self.registry.len();
        self.live_count_tx.send_replace(count);
        self.registry
            .broadcast(&ServerMessage::LiveCount { count }, None);
    }
}
