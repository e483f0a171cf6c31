use presence_core::ProtocolError;
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("browser API error: {0}")]
    Js(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("invalid value from JS: {0}")]
    Value(String),

    #[error("{0}")]
    Missing(&'static str),
}

impl From<JsValue> for EngineError {
    fn from(value: JsValue) -> Self {
        let text = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&value, &"message".into())
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", value));
        EngineError::Js(text)
    }
}

impl From<serde_wasm_bindgen::Error> for EngineError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        EngineError::Value(e.to_string())
    }
}

impl From<EngineError> for JsValue {
    fn from(e: EngineError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
