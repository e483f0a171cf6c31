use anyhow::{Result, bail};
use async_trait::async_trait;
use presence_client::{PeerEventSink, PeerSignal, PeerTransport, TransportFactory};
use presence_core::mesh::TrackInfo;
use presence_core::{IceCandidate, IceServerConfig, SdpKind, SessionDescription, SessionId};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const CALLS_TIMEOUT_MS: u64 = 2000;

/// One call made on a mock transport, tagged with the remote it served.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Open,
    CreateOffer,
    CreateAnswer,
    SetRemote(SdpKind),
    AddCandidate(String),
    Close,
}

/// Records every transport call and hands out scripted SDP.
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    calls: Arc<Mutex<Vec<(SessionId, TransportCall)>>>,
    fail_answers: bool,
    stall_answers: bool,
    media_ok: bool,
}

impl MockTransportFactory {
    pub fn new() -> Self {
        Self {
            media_ok: true,
            ..Self::default()
        }
    }

    pub fn receive_only() -> Self {
        Self::default()
    }

    pub fn failing_answers() -> Self {
        Self {
            fail_answers: true,
            media_ok: true,
            ..Self::default()
        }
    }

    /// Answers never finish, leaving the worker parked mid-action.
    pub fn stalling_answers() -> Self {
        Self {
            stall_answers: true,
            media_ok: true,
            ..Self::default()
        }
    }

    /// Polls until at least `n` calls were made for `remote`.
    pub async fn wait_for_calls(&self, remote: &SessionId, n: usize) -> Vec<TransportCall> {
        let deadline = Instant::now() + Duration::from_millis(CALLS_TIMEOUT_MS);
        loop {
            let calls = self.calls_for(remote);
            if calls.len() >= n || Instant::now() >= deadline {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Polls until `call` was made for `remote`.
    pub async fn wait_for_call(&self, remote: &SessionId, call: TransportCall) -> Vec<TransportCall> {
        let deadline = Instant::now() + Duration::from_millis(CALLS_TIMEOUT_MS);
        loop {
            let calls = self.calls_for(remote);
            if calls.contains(&call) || Instant::now() >= deadline {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub fn calls_for(&self, remote: &SessionId) -> Vec<TransportCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == remote)
            .map(|(_, call)| call.clone())
            .collect()
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn open(
        &self,
        _ice_servers: &[IceServerConfig],
        events: PeerEventSink,
    ) -> Result<Box<dyn PeerTransport>> {
        let remote = events.remote().clone();
        self.calls
            .lock()
            .unwrap()
            .push((remote.clone(), TransportCall::Open));

        Ok(Box::new(MockTransport {
            remote,
            calls: self.calls.clone(),
            events,
            fail_answers: self.fail_answers,
            stall_answers: self.stall_answers,
        }))
    }

    async fn prepare_media(&self) -> Result<()> {
        if !self.media_ok {
            bail!("camera permission denied");
        }
        Ok(())
    }
}

pub struct MockTransport {
    remote: SessionId,
    calls: Arc<Mutex<Vec<(SessionId, TransportCall)>>>,
    events: PeerEventSink,
    fail_answers: bool,
    stall_answers: bool,
}

impl MockTransport {
    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push((self.remote.clone(), call));
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn create_offer(&self) -> Result<String> {
        self.record(TransportCall::CreateOffer);
        self.events
            .emit(PeerSignal::LocalCandidate(IceCandidate::new("candidate:offerer")));
        Ok(format!("offer-for-{}", self.remote))
    }

    async fn create_answer(&self) -> Result<String> {
        self.record(TransportCall::CreateAnswer);
        if self.fail_answers {
            bail!("codec mismatch");
        }
        if self.stall_answers {
            std::future::pending::<()>().await;
        }
        self.events
            .emit(PeerSignal::LocalCandidate(IceCandidate::new("candidate:answerer")));
        Ok(format!("answer-for-{}", self.remote))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.record(TransportCall::SetRemote(description.kind));
        if description.kind == SdpKind::Offer {
            self.events.emit(PeerSignal::RemoteTrack(TrackInfo {
                track_id: format!("video-{}", self.remote),
                kind: "video".to_owned(),
            }));
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(TransportCall::AddCandidate(candidate.candidate));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(TransportCall::Close);
        Ok(())
    }
}
