use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::engine::{EngineInner, PresenceEngine, Ticker};
use crate::error::EngineError;
use crate::logger::Logger;

impl PresenceEngine {
    /// Publishes the current pose every `tick_ms` once welcomed.
    pub(crate) fn start_ticker(
        inner: &Rc<RefCell<EngineInner>>,
        tick_ms: u32,
    ) -> Result<(), EngineError> {
        Self::stop_ticker(inner);
        let window = web_sys::window().ok_or(EngineError::Missing("no window"))?;

        let callback = {
            let inner = inner.clone();
            Closure::<dyn FnMut()>::wrap(Box::new(move || {
                let frame = {
                    let guard = inner.borrow();
                    if !guard.connected || guard.session.local_id().is_none() {
                        return;
                    }
                    guard.session.outgoing_transform(guard.pose.clone()).encode()
                };
                match frame {
                    Ok(json) => Self::send_text(&inner, &json),
                    Err(e) => Logger::warn(&format!("Failed to encode transform: {}", e)),
                }
            }))
        };

        let timeout = i32::try_from(tick_ms).unwrap_or(i32::MAX).max(1);
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            timeout,
        )?;
        inner.borrow_mut().ticker = Some(Ticker {
            handle,
            _callback: callback,
        });
        Ok(())
    }

    pub(crate) fn stop_ticker(inner: &Rc<RefCell<EngineInner>>) {
        let Some(ticker) = inner.borrow_mut().ticker.take() else {
            return;
        };
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(ticker.handle);
        }
    }
}
