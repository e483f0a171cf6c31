use presence_core::mesh::TrackInfo;
use presence_core::{IceCandidate, IceServerConfig, SessionId};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    MediaStreamTrack, RtcPeerConnection, RtcPeerConnectionState, RtcRtpTransceiver,
    RtcRtpTransceiverDirection,
};

use crate::engine::{EngineInner, PeerSignal, PresenceEngine};
use crate::error::EngineError;
use crate::logger::Logger;

/// A peer connection plus the JS callbacks registered on it. Dropping it
/// detaches the callbacks and closes the connection.
pub(crate) struct PeerConnection {
    pub(crate) pc: RtcPeerConnection,
    _onicecandidate: Closure<dyn FnMut(web_sys::RtcPeerConnectionIceEvent)>,
    _ontrack: Closure<dyn FnMut(web_sys::RtcTrackEvent)>,
    _onconnectionstatechange: Closure<dyn FnMut(JsValue)>,
}

impl Drop for PeerConnection {
    fn drop(&mut self) {
        self.pc.set_onicecandidate(None);
        self.pc.set_ontrack(None);
        self.pc.set_onconnectionstatechange(None);
        self.pc.close();
    }
}

impl PresenceEngine {
    pub(crate) fn create_pc(
        inner: &Rc<RefCell<EngineInner>>,
        remote: &SessionId,
        generation: u64,
        ice_servers: &[IceServerConfig],
    ) -> Result<PeerConnection, EngineError> {
        let rtc_config = web_sys::RtcConfiguration::new();
        let ice_servers_arr = js_sys::Array::new();

        for server_config in ice_servers {
            let rtc_ice_server = web_sys::RtcIceServer::new();

            let urls = js_sys::Array::new();
            for url in &server_config.urls {
                urls.push(&JsValue::from_str(url));
            }
            rtc_ice_server.set_urls(&urls);

            if let Some(username) = &server_config.username {
                rtc_ice_server.set_username(username);
            }

            if let Some(credential) = &server_config.credential {
                rtc_ice_server.set_credential(credential);
            }

            ice_servers_arr.push(&rtc_ice_server);
        }
        rtc_config.set_ice_servers(&ice_servers_arr);

        let pc = RtcPeerConnection::new_with_configuration(&rtc_config)?;

        let onicecandidate = {
            let inner = inner.clone();
            let remote = remote.clone();
            Closure::wrap(Box::new(move |ev: web_sys::RtcPeerConnectionIceEvent| {
                let Some(candidate) = ev.candidate() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: candidate.candidate(),
                    sdp_mid: candidate.sdp_mid(),
                    sdp_m_line_index: candidate.sdp_m_line_index(),
                };
                Self::on_peer_signal(
                    &inner,
                    &remote,
                    generation,
                    PeerSignal::LocalCandidate(candidate),
                );
            }) as Box<dyn FnMut(web_sys::RtcPeerConnectionIceEvent)>)
        };
        pc.set_onicecandidate(Some(onicecandidate.as_ref().unchecked_ref()));

        let ontrack = {
            let inner = inner.clone();
            let remote = remote.clone();
            Closure::wrap(Box::new(move |ev: web_sys::RtcTrackEvent| {
                let track = ev.track();
                Logger::info(&format!("Remote {} track from {}", track.kind(), remote));
                Self::present_track(&inner, &remote, &ev);
                Self::on_peer_signal(
                    &inner,
                    &remote,
                    generation,
                    PeerSignal::RemoteTrack(TrackInfo {
                        track_id: track.id(),
                        kind: track.kind(),
                    }),
                );
            }) as Box<dyn FnMut(web_sys::RtcTrackEvent)>)
        };
        pc.set_ontrack(Some(ontrack.as_ref().unchecked_ref()));

        let onconnectionstatechange = {
            let inner = inner.clone();
            let remote = remote.clone();
            let pc = pc.clone();
            Closure::wrap(Box::new(move |_: JsValue| {
                let state = pc.connection_state();
                Logger::debug(&format!("Peer connection state for {}: {:?}", remote, state));
                let reason = match state {
                    RtcPeerConnectionState::Failed => "ICE connection failed",
                    RtcPeerConnectionState::Closed => "peer connection closed",
                    _ => return,
                };
                Self::on_peer_signal(
                    &inner,
                    &remote,
                    generation,
                    PeerSignal::Failed(reason.to_owned()),
                );
            }) as Box<dyn FnMut(JsValue)>)
        };
        pc.set_onconnectionstatechange(Some(onconnectionstatechange.as_ref().unchecked_ref()));

        Ok(PeerConnection {
            pc,
            _onicecandidate: onicecandidate,
            _ontrack: ontrack,
            _onconnectionstatechange: onconnectionstatechange,
        })
    }

    /// Offers one sendrecv audio and one video transceiver whether or not
    /// the camera is ready, so media arriving later needs no renegotiation.
    pub(crate) fn prepare_offer_media(inner: &Rc<RefCell<EngineInner>>, pc: &RtcPeerConnection) {
        if pc.get_transceivers().length() == 0 {
            let init = web_sys::RtcRtpTransceiverInit::new();
            init.set_direction(RtcRtpTransceiverDirection::Sendrecv);
            for kind in ["audio", "video"] {
                pc.add_transceiver_with_str_and_init(kind, &init);
            }
        }
        Self::send_local_tracks(inner, pc);
    }

    /// Runs after the remote offer is applied and before the answer is
    /// created.
    pub(crate) fn prepare_answer_media(inner: &Rc<RefCell<EngineInner>>, pc: &RtcPeerConnection) {
        for transceiver in pc.get_transceivers().iter() {
            let transceiver: RtcRtpTransceiver = transceiver.unchecked_into();
            transceiver.set_direction(RtcRtpTransceiverDirection::Sendrecv);
        }
        Self::send_local_tracks(inner, pc);
    }

    /// Puts a local track of the matching kind on every idle sender. A no-op
    /// until local media is available.
    pub(crate) fn send_local_tracks(inner: &Rc<RefCell<EngineInner>>, pc: &RtcPeerConnection) {
        let Some(stream) = inner.borrow().local_stream.clone() else {
            return;
        };
        let tracks: Vec<MediaStreamTrack> = stream
            .get_tracks()
            .iter()
            .map(|track| track.unchecked_into())
            .collect();

        for transceiver in pc.get_transceivers().iter() {
            let transceiver: RtcRtpTransceiver = transceiver.unchecked_into();
            let sender = transceiver.sender();
            if sender.track().is_some() {
                continue;
            }
            let kind = transceiver.receiver().track().kind();
            let Some(track) = tracks.iter().find(|track| track.kind() == kind) else {
                continue;
            };

            let pending = JsFuture::from(sender.replace_track(Some(track)));
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = pending.await {
                    Logger::error("Failed to send local track", &e);
                }
            });
        }
    }

    fn present_track(
        inner: &Rc<RefCell<EngineInner>>,
        remote: &SessionId,
        ev: &web_sys::RtcTrackEvent,
    ) {
        let Some(cb) = inner.borrow().track_callback.clone() else {
            return;
        };

        let stream = match ev.streams().get(0).dyn_into::<web_sys::MediaStream>() {
            Ok(stream) => stream,
            Err(_) => match web_sys::MediaStream::new() {
                Ok(stream) => {
                    stream.add_track(&ev.track());
                    stream
                }
                Err(e) => {
                    Logger::error("Failed to wrap remote track", &e);
                    return;
                }
            },
        };

        if let Err(e) = cb.call2(&JsValue::NULL, &JsValue::from_str(remote.as_str()), &stream) {
            Logger::error("Track handler threw", &e);
        }
    }
}
