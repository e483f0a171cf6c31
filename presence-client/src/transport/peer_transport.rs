use crate::transport::PeerEventSink;
use anyhow::Result;
use async_trait::async_trait;
use presence_core::{IceCandidate, IceServerConfig, SessionDescription};

/// One direct media connection to a remote session.
///
/// Calls arrive strictly one at a time from the owning peer worker. Local ICE
/// candidates and remote tracks are reported through the [`PeerEventSink`]
/// handed to [`TransportFactory::open`].
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates an offer, applies it locally and returns its SDP.
    async fn create_offer(&self) -> Result<String>;

    /// Creates an answer, applies it locally and returns its SDP.
    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn open(
        &self,
        ice_servers: &[IceServerConfig],
        events: PeerEventSink,
    ) -> Result<Box<dyn PeerTransport>>;

    /// Acquires local capture devices. An error leaves the client receive-only.
    async fn prepare_media(&self) -> Result<()> {
        Ok(())
    }
}
