use crate::error::ClientError;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use presence_core::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{info, warn};

type RelaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// JSON frame codec over the relay WebSocket.
pub struct RelayConnection {
    sink: SplitSink<RelaySocket, Message>,
    stream: SplitStream<RelaySocket>,
}

impl RelayConnection {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::Connect {
                url: url.to_owned(),
                source: Box::new(e),
            })?;
        info!("Connected to relay at {}", url);

        let (sink, stream) = socket.split();
        Ok(Self { sink, stream })
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<(), ClientError> {
        let text = msg.encode()?;
        self.sink.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Next decodable frame. Undecodable text frames are logged and skipped;
    /// `None` means the relay hung up.
    pub async fn recv(&mut self) -> Option<Result<ServerMessage, ClientError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match ServerMessage::decode(text.as_str()) {
                    Ok(msg) => return Some(Ok(msg)),
                    Err(e) => warn!("Invalid frame from relay: {}", e),
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    pub async fn close(mut self) {
        let _ = self.sink.close().await;
    }
}
