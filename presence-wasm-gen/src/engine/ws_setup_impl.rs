use presence_core::ServerMessage;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::WebSocket;

use crate::engine::{EngineConfig, EngineInner, PresenceEngine};
use crate::error::EngineError;
use crate::logger::Logger;

impl PresenceEngine {
    pub(crate) fn ws_setup(
        inner: &Rc<RefCell<EngineInner>>,
        config: &EngineConfig,
    ) -> Result<(), EngineError> {
        let ws = WebSocket::new(&config.url)?;

        let onopen_callback = {
            let inner = inner.clone();
            let tick_ms = config.transform_tick_ms;
            Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
                Logger::info("Relay socket open");
                inner.borrow_mut().connected = true;
                if let Err(e) = Self::start_ticker(&inner, tick_ms) {
                    Logger::error("Failed to start transform ticker", &JsValue::from(e));
                }
            }))
        };
        ws.set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));
        onopen_callback.forget();

        let onmessage_callback = {
            let inner = inner.clone();
            Closure::<dyn FnMut(web_sys::MessageEvent)>::wrap(Box::new(
                move |e: web_sys::MessageEvent| {
                    let Ok(text) = e.data().dyn_into::<js_sys::JsString>() else {
                        Logger::warn("Ignoring non-text relay frame");
                        return;
                    };
                    let text: String = text.into();
                    match ServerMessage::decode(&text) {
                        Ok(msg) => {
                            let actions = inner.borrow_mut().session.handle_server_message(msg);
                            Self::execute(&inner, actions);
                        }
                        Err(e) => Logger::warn(&format!("Invalid relay frame: {}", e)),
                    }
                },
            ))
        };
        ws.set_onmessage(Some(onmessage_callback.as_ref().unchecked_ref()));
        onmessage_callback.forget();

        let onerror_callback = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |e: JsValue| {
            Logger::error("Relay socket error", &e);
        }));
        ws.set_onerror(Some(onerror_callback.as_ref().unchecked_ref()));
        onerror_callback.forget();

        let onclose_callback = {
            let inner = inner.clone();
            Closure::<dyn FnMut(web_sys::CloseEvent)>::wrap(Box::new(
                move |e: web_sys::CloseEvent| {
                    Logger::warn(&format!("Relay socket closed ({}) {}", e.code(), e.reason()));
                    Self::connection_lost(&inner);
                },
            ))
        };
        ws.set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));
        onclose_callback.forget();

        inner.borrow_mut().ws = Some(ws);
        Ok(())
    }

    fn connection_lost(inner: &Rc<RefCell<EngineInner>>) {
        Self::stop_ticker(inner);
        let actions = {
            let mut guard = inner.borrow_mut();
            guard.connected = false;
            guard.ws = None;
            guard.session.connection_lost()
        };
        Self::execute(inner, actions);
    }
}
