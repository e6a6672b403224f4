use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use framelink_channel::{ChannelConfig, ListenerId, MessageChannel};
use framelink_protocol::{PROTOCOL_FLAG, RENDER_EVENT, SET_COMPONENT_VALUE};
use framelink_transport::{Result as TransportResult, TransportError};
use js_sys::{Object, Reflect};
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::error::{describe, invalid_state, to_js_error};
use crate::transport::{to_js, DomHeightProbe, WindowTransport};

type BrowserChannel = MessageChannel<WindowTransport, DomHeightProbe>;

/// Name of the event render listeners subscribe to.
#[wasm_bindgen(js_name = renderEvent)]
pub fn render_event() -> String {
    RENDER_EVENT.to_string()
}

/// An embedded component's link to its host page.
#[wasm_bindgen]
pub struct Component {
    inner: RefCell<Option<BrowserChannel>>,
    listeners: RefCell<HashMap<u32, ListenerId>>,
    next_listener: Cell<u32>,
}

impl Component {
    fn with_channel<T>(&self, f: impl FnOnce(&BrowserChannel) -> T) -> Result<T, JsError> {
        let guard = self.inner.borrow();
        let channel = guard
            .as_ref()
            .ok_or_else(|| invalid_state("component is disposed"))?;
        Ok(f(channel))
    }
}

#[wasm_bindgen]
impl Component {
    /// Start listening for host messages. Call once per page.
    pub fn init(dedupe_frame_height: Option<bool>) -> Result<Component, JsError> {
        let transport =
            WindowTransport::new().map_err(|err| to_js_error("component init failed", err))?;
        let config = ChannelConfig {
            dedupe_frame_height: dedupe_frame_height.unwrap_or(false),
            ..ChannelConfig::default()
        };
        let channel = MessageChannel::init_with_config(transport, DomHeightProbe::new(), config)
            .map_err(|err| to_js_error("component init failed", err))?;

        Ok(Self {
            inner: RefCell::new(Some(channel)),
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(1),
        })
    }

    #[wasm_bindgen(js_name = announceReady)]
    pub fn announce_ready(&self) -> Result<(), JsError> {
        self.with_channel(|channel| channel.announce_ready())
    }

    /// Resize the frame. Omit the height, or pass anything that is not a
    /// positive number, to measure the document instead.
    #[wasm_bindgen(js_name = reportHeight)]
    pub fn report_height(&self, height: JsValue) -> Result<(), JsError> {
        self.with_channel(|channel| channel.report_height(height.as_f64()))
    }

    /// Send a value to the host. It is posted as-is, so anything the
    /// structured clone algorithm accepts reaches the host unchanged.
    #[wasm_bindgen(js_name = emitValue)]
    pub fn emit_value(&self, value: JsValue) -> Result<(), JsError> {
        self.with_channel(|channel| {
            let sent = component_value_record(&value)
                .and_then(|record| channel.transport().post_raw(&record));
            if let Err(err) = sent {
                debug!(error = %err, "setComponentValue not sent");
            }
        })
    }

    /// Call `callback` with every render message, exactly as the host posted
    /// it; returns an id for [`off_render`](Self::off_render).
    #[wasm_bindgen(js_name = onRender)]
    pub fn on_render(&self, callback: js_sys::Function) -> Result<u32, JsError> {
        let listener = self.with_channel(|channel| {
            let current = channel.transport().current_message();
            channel.events().on_render(move |event| {
                let message = current.get().or_else(|| to_js(&event.detail).ok());
                // Exceptions thrown by the callback stay in the callback.
                if let Some(message) = message {
                    let _ = callback.call1(&JsValue::NULL, &message);
                }
            })
        })?;

        let id = self.next_listener.get();
        self.next_listener.set(id.wrapping_add(1));
        self.listeners.borrow_mut().insert(id, listener);
        Ok(id)
    }

    /// Remove a render callback. Returns `false` for unknown ids.
    #[wasm_bindgen(js_name = offRender)]
    pub fn off_render(&self, id: u32) -> Result<bool, JsError> {
        let Some(listener) = self.listeners.borrow_mut().remove(&id) else {
            return Ok(false);
        };
        self.with_channel(|channel| channel.events().remove_event_listener(listener))
    }

    /// Stop listening for host messages. Later calls throw.
    ///
    /// Safe inside a render callback: the running window listener is freed
    /// once it returns, and callbacks not yet reached for that message are
    /// skipped.
    pub fn dispose(&self) -> Result<(), JsError> {
        let channel = self
            .inner
            .borrow_mut()
            .take()
            .ok_or_else(|| invalid_state("component is disposed"))?;
        self.listeners.borrow_mut().clear();
        channel
            .dispose()
            .map_err(|err| to_js_error("dispose failed", err))
    }

    #[wasm_bindgen(getter, js_name = isDisposed)]
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().is_none()
    }
}

/// `{ isStreamlitMessage: true, type: "setComponentValue", value }` built in
/// JavaScript so `value` keeps its original form.
fn component_value_record(value: &JsValue) -> TransportResult<JsValue> {
    let record = Object::new();
    let fields = [
        (PROTOCOL_FLAG, JsValue::TRUE),
        ("type", JsValue::from_str(SET_COMPONENT_VALUE)),
        ("value", value.clone()),
    ];
    for (key, field) in fields {
        Reflect::set(&record, &JsValue::from_str(key), &field)
            .map_err(|err| TransportError::Post(describe(&err)))?;
    }
    Ok(record.into())
}
