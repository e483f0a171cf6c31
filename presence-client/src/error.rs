use presence_core::ProtocolError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to reach relay at {url}")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    #[error("relay socket error")]
    Socket(#[source] Box<tungstenite::Error>),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("relay closed the connection")]
    RelayClosed,
}

impl From<tungstenite::Error> for ClientError {
    fn from(e: tungstenite::Error) -> Self {
        ClientError::Socket(Box::new(e))
    }
}
