use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::engine::{EngineInner, PresenceEngine};
use crate::error::EngineError;

impl PresenceEngine {
    /// Opens camera and microphone. Fails when the user declines or the page
    /// has no capture devices; the session then continues receive-only.
    pub(crate) async fn start_media() -> Result<web_sys::MediaStream, EngineError> {
        let window = web_sys::window().ok_or(EngineError::Missing("no window"))?;
        let devices = window.navigator().media_devices()?;

        let constraints = web_sys::MediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);
        constraints.set_video(&JsValue::TRUE);

        let stream = JsFuture::from(devices.get_user_media_with_constraints(&constraints)?).await?;
        Ok(stream.dyn_into::<web_sys::MediaStream>()?)
    }

    /// Stores the stream and starts sending it on every link that already
    /// has a connection.
    pub(crate) fn media_ready(inner: &Rc<RefCell<EngineInner>>, stream: web_sys::MediaStream) {
        inner.borrow_mut().local_stream = Some(stream);
        let open: Vec<_> = inner
            .borrow()
            .peers
            .values()
            .filter_map(|slot| slot.pc.clone())
            .collect();
        for pc in &open {
            Self::send_local_tracks(inner, pc);
        }
    }
}
