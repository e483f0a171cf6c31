use presence_core::Transform;
use wasm_bindgen::prelude::*;

use crate::engine::{EngineConfig, PresenceEngine};
use crate::error::EngineError;

/// JS entry point. Events arrive as plain objects tagged with `event`
/// (`welcomed`, `avatar_updated`, `avatar_removed`, `live_count`, ...).
#[wasm_bindgen]
pub struct PresenceClient {
    engine: PresenceEngine,
}

#[wasm_bindgen]
impl PresenceClient {
    #[wasm_bindgen(constructor)]
    pub fn new(url: String) -> Result<PresenceClient, JsValue> {
        Self::with_config(EngineConfig::new(url))
    }

    /// Joins without asking for camera or microphone.
    #[wasm_bindgen(js_name = receiveOnly)]
    pub fn receive_only(url: String) -> Result<PresenceClient, JsValue> {
        let mut config = EngineConfig::new(url);
        config.request_media = false;
        Self::with_config(config)
    }

    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&self, callback: js_sys::Function) {
        self.engine.set_event_handler(callback);
    }

    /// `callback(remoteId, mediaStream)`
    #[wasm_bindgen(js_name = onTrack)]
    pub fn on_track(&self, callback: js_sys::Function) {
        self.engine.set_track_handler(callback);
    }

    /// Accepts `{ position: {x, y, z}, rotation: {x, y, z}, ... }`. Missing
    /// or non-numeric components read as zero, extra keys travel along.
    #[wasm_bindgen(js_name = setTransform)]
    pub fn set_transform(&self, transform: JsValue) -> Result<(), JsValue> {
        let transform: Transform =
            serde_wasm_bindgen::from_value(transform).map_err(EngineError::from)?;
        self.engine.set_transform(transform);
        Ok(())
    }

    #[wasm_bindgen(getter, js_name = localId)]
    pub fn local_id(&self) -> Option<String> {
        self.engine.local_id().map(|id| id.as_str().to_owned())
    }

    #[wasm_bindgen(getter, js_name = liveCount)]
    pub fn live_count(&self) -> usize {
        self.engine.live_count()
    }

    #[wasm_bindgen(getter, js_name = localStream)]
    pub fn local_stream(&self) -> Option<web_sys::MediaStream> {
        self.engine.local_stream()
    }

    pub fn close(&self) {
        self.engine.close();
    }
}

impl PresenceClient {
    fn with_config(config: EngineConfig) -> Result<PresenceClient, JsValue> {
        let engine = PresenceEngine::new(config)?;
        Ok(PresenceClient { engine })
    }
}
