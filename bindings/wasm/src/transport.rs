use std::cell::{Cell, RefCell};
use std::rc::Rc;

use framelink_transport::{FrameTransport, HeightProbe, InboundHandler, Result, TransportError};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, MessageEvent, Window};

use crate::error::describe;

const MESSAGE_EVENT: &str = "message";

type MessageListener = Closure<dyn FnMut(MessageEvent)>;

thread_local! {
    // One window `message` listener per JavaScript realm.
    static WINDOW_LISTENER_ATTACHED: Cell<bool> = const { Cell::new(false) };
}

/// The `event.data` of the message currently being dispatched.
///
/// Set only while the inbound handler runs, so render listeners can hand the
/// host's original value to JavaScript instead of its JSON projection.
#[derive(Clone, Default)]
pub struct CurrentMessage(Rc<RefCell<Option<JsValue>>>);

impl CurrentMessage {
    pub fn get(&self) -> Option<JsValue> {
        self.0.borrow().clone()
    }

    fn replace(&self, data: Option<JsValue>) -> Option<JsValue> {
        self.0.replace(data)
    }
}

/// Transport over `window.parent.postMessage` and the window `message` event.
///
/// Records are posted with target origin `"*"`; inbound messages are accepted
/// from any origin. Only one transport per realm can be attached at a time.
pub struct WindowTransport {
    window: Window,
    listener: RefCell<Option<MessageListener>>,
    current: CurrentMessage,
}

impl WindowTransport {
    /// Bind to the global `window`.
    pub fn new() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| TransportError::Listener("no global window".to_string()))?;
        Ok(Self::from_window(window))
    }

    pub fn from_window(window: Window) -> Self {
        Self {
            window,
            listener: RefCell::new(None),
            current: CurrentMessage::default(),
        }
    }

    pub fn current_message(&self) -> CurrentMessage {
        self.current.clone()
    }

    /// Post a record built in JavaScript as-is.
    pub fn post_raw(&self, record: &JsValue) -> Result<()> {
        let parent = self.parent().ok_or(TransportError::NoParent)?;
        parent
            .post_message(record, "*")
            .map_err(|err| TransportError::Post(describe(&err)))
    }

    /// The embedding window, or `None` when this window is top-level.
    fn parent(&self) -> Option<Window> {
        let parent = self.window.parent().ok().flatten()?;
        if js_sys::Object::is(&parent, &self.window) {
            return None;
        }
        Some(parent)
    }
}

impl FrameTransport for WindowTransport {
    fn post_to_parent(&self, message: &Value) -> Result<()> {
        self.post_raw(&to_js(message)?)
    }

    fn attach(&self, handler: InboundHandler) -> Result<()> {
        let mut slot = self.listener.borrow_mut();
        if slot.is_some() || WINDOW_LISTENER_ATTACHED.with(Cell::get) {
            return Err(TransportError::AlreadyAttached);
        }

        let current = self.current.clone();
        let listener = Closure::wrap(Box::new(move |event: MessageEvent| {
            let data = event.data();
            let raw = inbound_record(&data);
            let outer = current.replace(Some(data));
            handler(raw.as_ref());
            current.replace(outer);
        }) as Box<dyn FnMut(MessageEvent)>);

        self.window
            .add_event_listener_with_callback(MESSAGE_EVENT, listener.as_ref().unchecked_ref())
            .map_err(|err| TransportError::Listener(describe(&err)))?;
        *slot = Some(listener);
        WINDOW_LISTENER_ATTACHED.with(|attached| attached.set(true));
        debug!("window message listener attached");
        Ok(())
    }

    fn detach(&self) -> Result<()> {
        let Some(listener) = self.listener.borrow_mut().take() else {
            return Ok(());
        };
        WINDOW_LISTENER_ATTACHED.with(|attached| attached.set(false));
        self.window
            .remove_event_listener_with_callback(MESSAGE_EVENT, listener.as_ref().unchecked_ref())
            .map_err(|err| TransportError::Listener(describe(&err)))?;
        debug!("window message listener detached");
        Ok(())
    }

    fn has_parent(&self) -> bool {
        self.parent().is_some()
    }
}

impl Drop for WindowTransport {
    fn drop(&mut self) {
        let _ = self.detach();
    }
}

/// Height probes over `document.documentElement` and `document.body`.
pub struct DomHeightProbe {
    document: Option<Document>,
}

impl DomHeightProbe {
    pub fn new() -> Self {
        Self {
            document: web_sys::window().and_then(|window| window.document()),
        }
    }
}

impl Default for DomHeightProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HeightProbe for DomHeightProbe {
    fn root_scroll_height(&self) -> Option<f64> {
        let root = self.document.as_ref()?.document_element()?;
        Some(f64::from(root.scroll_height()))
    }

    fn body_scroll_height(&self) -> Option<f64> {
        let body = self.document.as_ref()?.body()?;
        Some(f64::from(body.scroll_height()))
    }
}

/// Plain-object conversion: JSON maps become JS objects, not `Map`s.
pub(crate) fn to_js(value: &Value) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| TransportError::Post(err.to_string()))
}

/// JSON view of inbound `event.data`.
///
/// Members with no JSON form (typed arrays, `BigInt`, `Set`) are left out of
/// the view rather than dropping the message; a string `type` always survives.
pub(crate) fn inbound_record(data: &JsValue) -> Option<Value> {
    if data.is_undefined() {
        return None;
    }
    if let Ok(value) = serde_wasm_bindgen::from_value(data.clone()) {
        return Some(value);
    }

    let object = data.dyn_ref::<js_sys::Object>()?;
    let mut fields = Map::new();
    for key in js_sys::Object::keys(object).iter() {
        let Some(name) = key.as_string() else {
            continue;
        };
        let Ok(member) = js_sys::Reflect::get(data, &key) else {
            continue;
        };
        if let Ok(member) = serde_wasm_bindgen::from_value::<Value>(member) {
            fields.insert(name, member);
        }
    }
    Some(Value::Object(fields))
}
