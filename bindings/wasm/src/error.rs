use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub(crate) fn to_js_error(context: &str, err: impl std::fmt::Display) -> JsError {
    JsError::new(&format!("{context}: {err}"))
}

pub(crate) fn invalid_state(message: &str) -> JsError {
    JsError::new(message)
}

/// Best-effort text for a thrown JavaScript value.
pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}
