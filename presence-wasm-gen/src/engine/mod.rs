use futures::channel::mpsc;
use presence_core::mesh::{MeshAction, MeshEvent, MeshSession, TrackInfo};
use presence_core::utils::{HANDSHAKE_TIMEOUT_MS, TRANSFORM_TICK_MS};
use presence_core::{IceCandidate, SessionDescription, SessionId, Transform};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::Closure;

use crate::error::EngineError;
use crate::logger::Logger;

mod create_pc_impl;
mod execute_impl;
mod media_impl;
mod peer_signal_impl;
mod peer_worker_impl;
mod ticker_impl;
mod ws_setup_impl;

#[derive(Clone)]
pub struct EngineConfig {
    pub url: String,
    /// Ask for camera and microphone before joining.
    pub request_media: bool,
    pub transform_tick_ms: u32,
    /// A link still short of `Connected` after this long is dropped.
    pub handshake_timeout_ms: u32,
}

impl EngineConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_media: true,
            transform_tick_ms: TRANSFORM_TICK_MS as u32,
            handshake_timeout_ms: HANDSHAKE_TIMEOUT_MS as u32,
        }
    }
}

/// What a peer worker or its connection callbacks report back.
#[derive(Debug)]
pub(crate) enum PeerSignal {
    LocalDescription(SessionDescription),
    LocalCandidate(IceCandidate),
    RemoteTrack(TrackInfo),
    Failed(String),
    HandshakeTimeout,
}

/// Queue into one peer's worker task, tagged with the worker generation.
/// Dropping the slot closes its connection at once, even while the worker
/// is still awaiting a promise on it.
pub(crate) struct PeerSlot {
    generation: u64,
    tx: mpsc::UnboundedSender<MeshAction>,
    /// Set by the worker once the connection exists.
    pc: Option<web_sys::RtcPeerConnection>,
    _deadline: Option<Deadline>,
}

impl PeerSlot {
    fn push(&self, action: MeshAction) -> bool {
        self.tx.unbounded_send(action).is_ok()
    }
}

impl Drop for PeerSlot {
    fn drop(&mut self) {
        if let Some(pc) = self.pc.take() {
            pc.close();
        }
    }
}

/// Pending `setTimeout`, cleared when dropped.
pub(crate) struct Deadline {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Drop for Deadline {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(self.handle);
        }
    }
}

pub(crate) struct Ticker {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

pub(crate) struct EngineInner {
    session: MeshSession,
    ws: Option<web_sys::WebSocket>,
    connected: bool,
    peers: HashMap<SessionId, PeerSlot>,
    next_generation: u64,
    handshake_timeout_ms: u32,
    local_stream: Option<web_sys::MediaStream>,
    pose: Transform,
    event_callback: Option<js_sys::Function>,
    track_callback: Option<js_sys::Function>,
    ticker: Option<Ticker>,
}

/// Browser driver for a [`MeshSession`]: relay socket, one
/// `RtcPeerConnection` per remote session and the local camera stream.
pub struct PresenceEngine {
    inner: Rc<RefCell<EngineInner>>,
}

impl PresenceEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let inner = Rc::new(RefCell::new(EngineInner {
            session: MeshSession::new(),
            ws: None,
            connected: false,
            peers: HashMap::new(),
            next_generation: 0,
            handshake_timeout_ms: config.handshake_timeout_ms,
            local_stream: None,
            pose: Transform::default(),
            event_callback: None,
            track_callback: None,
            ticker: None,
        }));

        let engine = PresenceEngine { inner };
        engine.start(config)?;
        Ok(engine)
    }

    /// Media acquisition runs on its own. Links opened before it resolves
    /// start sending as soon as it does.
    fn start(&self, config: EngineConfig) -> Result<(), EngineError> {
        let inner = self.inner.clone();
        let request_media = config.request_media;
        wasm_bindgen_futures::spawn_local(async move {
            if !request_media {
                Self::report_media_unavailable(&inner, EngineError::Missing("media disabled"));
                return;
            }
            match Self::start_media().await {
                Ok(stream) => {
                    Logger::info("Local media ready");
                    Self::media_ready(&inner, stream);
                }
                Err(e) => Self::report_media_unavailable(&inner, e),
            }
        });

        Self::ws_setup(&self.inner, &config)
    }

    fn report_media_unavailable(inner: &Rc<RefCell<EngineInner>>, e: EngineError) {
        Logger::warn(&format!("Local media unavailable: {}", e));
        let actions = inner.borrow().session.media_unavailable(e.to_string());
        Self::execute(inner, actions);
    }

    pub(crate) fn dispatch_event(inner: &Rc<RefCell<EngineInner>>, event: &MeshEvent) {
        // Clone out so the callback may call back into the engine.
        let Some(cb) = inner.borrow().event_callback.clone() else {
            return;
        };
        match event.serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
            Ok(js_val) => {
                if let Err(e) = cb.call1(&JsValue::NULL, &js_val) {
                    Logger::error("Event handler threw", &e);
                }
            }
            Err(e) => Logger::warn(&format!("Failed to convert event: {}", e)),
        }
    }

    pub fn set_event_handler(&self, callback: js_sys::Function) {
        self.inner.borrow_mut().event_callback = Some(callback);
    }

    /// `callback(remoteId, mediaStream)` for every remote track.
    pub fn set_track_handler(&self, callback: js_sys::Function) {
        self.inner.borrow_mut().track_callback = Some(callback);
    }

    /// Pose published on the next tick.
    pub fn set_transform(&self, transform: Transform) {
        self.inner.borrow_mut().pose = transform;
    }

    pub fn local_id(&self) -> Option<SessionId> {
        self.inner.borrow().session.local_id().cloned()
    }

    pub fn live_count(&self) -> usize {
        self.inner.borrow().session.live_count()
    }

    pub fn local_stream(&self) -> Option<web_sys::MediaStream> {
        self.inner.borrow().local_stream.clone()
    }

    /// Leaves the relay. Links are torn down from the socket's close handler.
    pub fn close(&self) {
        let ws = self.inner.borrow().ws.clone();
        if let Some(ws) = ws {
            if let Err(e) = ws.close() {
                Logger::error("Failed to close relay socket", &e);
            }
        }
    }
}
