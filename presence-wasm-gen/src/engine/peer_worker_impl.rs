use futures::StreamExt;
use futures::channel::mpsc;
use presence_core::mesh::MeshAction;
use presence_core::{IceCandidate, IceServerConfig, SdpKind, SessionDescription, SessionId};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen_futures::JsFuture;
use web_sys::{RtcSdpType, RtcSessionDescriptionInit};

use crate::engine::create_pc_impl::PeerConnection;
use crate::engine::{EngineInner, PeerSignal, PresenceEngine};
use crate::error::EngineError;
use crate::logger::Logger;

struct PeerWorker {
    inner: Rc<RefCell<EngineInner>>,
    remote: SessionId,
    generation: u64,
    ice_servers: Vec<IceServerConfig>,
    connection: Option<PeerConnection>,
    failed: bool,
}

impl PresenceEngine {
    /// One task per remote session runs that peer's actions strictly in
    /// order, since every browser WebRTC step is a promise.
    pub(crate) fn spawn_peer_worker(
        inner: &Rc<RefCell<EngineInner>>,
        remote: SessionId,
        generation: u64,
        ice_servers: Vec<IceServerConfig>,
        mut actions_rx: mpsc::UnboundedReceiver<MeshAction>,
    ) {
        let mut worker = PeerWorker {
            inner: inner.clone(),
            remote,
            generation,
            ice_servers,
            connection: None,
            failed: false,
        };

        wasm_bindgen_futures::spawn_local(async move {
            // Ends once the slot, and with it the sender, is dropped.
            while let Some(action) = actions_rx.next().await {
                if worker.failed {
                    continue;
                }
                if let Err(e) = worker.execute(action).await {
                    Logger::warn(&format!("Negotiation with {} failed: {}", worker.remote, e));
                    worker.failed = true;
                    worker.emit(PeerSignal::Failed(e.to_string()));
                }
            }

            if worker.connection.take().is_some() {
                Logger::info(&format!("Peer link to {} torn down", worker.remote));
            }
        });
    }
}

impl PeerWorker {
    async fn execute(&mut self, action: MeshAction) -> Result<(), EngineError> {
        match action {
            MeshAction::OpenPeer { .. } => {
                let connection = PresenceEngine::create_pc(
                    &self.inner,
                    &self.remote,
                    self.generation,
                    &self.ice_servers,
                )?;
                let pc = connection.pc.clone();
                self.connection = Some(connection);

                let mut guard = self.inner.borrow_mut();
                match guard.peers.get_mut(&self.remote) {
                    Some(slot) if slot.generation == self.generation => slot.pc = Some(pc),
                    _ => {}
                }
            }

            MeshAction::CreateOffer { .. } => {
                let pc = self.pc()?;
                PresenceEngine::prepare_offer_media(&self.inner, &pc);
                let offer = JsFuture::from(pc.create_offer()).await?;
                let sdp = Self::sdp_of(&offer)?;
                Self::set_local(&pc, RtcSdpType::Offer, &sdp).await?;
                self.emit(PeerSignal::LocalDescription(SessionDescription {
                    kind: SdpKind::Offer,
                    sdp,
                }));
            }

            MeshAction::CreateAnswer { .. } => {
                let pc = self.pc()?;
                PresenceEngine::prepare_answer_media(&self.inner, &pc);
                let answer = JsFuture::from(pc.create_answer()).await?;
                let sdp = Self::sdp_of(&answer)?;
                Self::set_local(&pc, RtcSdpType::Answer, &sdp).await?;
                self.emit(PeerSignal::LocalDescription(SessionDescription {
                    kind: SdpKind::Answer,
                    sdp,
                }));
            }

            MeshAction::ApplyRemoteDescription { description, .. } => {
                let pc = self.pc()?;
                let sdp_type = match description.kind {
                    SdpKind::Offer => RtcSdpType::Offer,
                    SdpKind::Answer => RtcSdpType::Answer,
                };
                let desc_init = RtcSessionDescriptionInit::new(sdp_type);
                desc_init.set_sdp(&description.sdp);
                JsFuture::from(pc.set_remote_description(&desc_init)).await?;
            }

            MeshAction::AddIceCandidate { candidate, .. } => {
                let pc = self.pc()?;
                if let Err(e) = Self::add_candidate(&pc, &candidate).await {
                    Logger::warn(&format!(
                        "Failed to add ICE candidate for {}: {}",
                        self.remote, e
                    ));
                }
            }

            MeshAction::ClosePeer { .. } | MeshAction::Send(_) | MeshAction::Notify(_) => {}
        }
        Ok(())
    }

    fn pc(&self) -> Result<web_sys::RtcPeerConnection, EngineError> {
        self.connection
            .as_ref()
            .map(|c| c.pc.clone())
            .ok_or(EngineError::Missing("no peer connection open"))
    }

    fn emit(&self, signal: PeerSignal) {
        PresenceEngine::on_peer_signal(&self.inner, &self.remote, self.generation, signal);
    }

    fn sdp_of(description: &wasm_bindgen::JsValue) -> Result<String, EngineError> {
        js_sys::Reflect::get(description, &"sdp".into())?
            .as_string()
            .ok_or(EngineError::Missing("session description without sdp"))
    }

    async fn set_local(
        pc: &web_sys::RtcPeerConnection,
        sdp_type: RtcSdpType,
        sdp: &str,
    ) -> Result<(), EngineError> {
        let init = RtcSessionDescriptionInit::new(sdp_type);
        init.set_sdp(sdp);
        JsFuture::from(pc.set_local_description(&init)).await?;
        Ok(())
    }

    async fn add_candidate(
        pc: &web_sys::RtcPeerConnection,
        candidate: &IceCandidate,
    ) -> Result<(), EngineError> {
        let init = web_sys::RtcIceCandidateInit::new(&candidate.candidate);
        init.set_sdp_mid(candidate.sdp_mid.as_deref());
        init.set_sdp_m_line_index(candidate.sdp_m_line_index);
        JsFuture::from(pc.add_ice_candidate_with_opt_rtc_ice_candidate_init(Some(&init))).await?;
        Ok(())
    }
}
