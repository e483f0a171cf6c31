use presence_core::{ServerMessage, SessionId, SignalPayload, Transform};
use tokio::sync::{mpsc, oneshot};

/// Commands fed into the relay loop by socket tasks.
#[derive(Debug)]
pub enum RelayCommand {
    /// A socket was upgraded. The relay allocates an id, registers the
    /// outbox and answers with the id.
    Connect {
        outbox: mpsc::UnboundedSender<ServerMessage>,
        reply: oneshot::Sender<SessionId>,
    },

    /// Latest pose reported by a session.
    Transform {
        session_id: SessionId,
        transform: Transform,
    },

    /// Handshake message to forward to exactly one session.
    Signal {
        from: SessionId,
        to: SessionId,
        payload: SignalPayload,
    },

    /// The socket closed or errored.
    Disconnect { session_id: SessionId },
}
