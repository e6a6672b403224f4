use serde_json::{Map, Value};

use crate::message::RENDER_EVENT;

/// A render instruction accepted from the host.
///
/// `detail` is the full inbound message, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEvent {
    pub detail: Value,
}

impl RenderEvent {
    pub fn new(detail: Value) -> Self {
        Self { detail }
    }

    /// Host-defined render arguments, when the message carries an `args` field.
    pub fn args(&self) -> Option<&Value> {
        self.detail.get("args")
    }

    /// Lenient structured view of the payload.
    pub fn data(&self) -> RenderData {
        RenderData::from_event(self)
    }
}

/// Filter one raw inbound message.
///
/// Accepts it only when it is present, non-null and its `type` equals
/// [`RENDER_EVENT`]. Origin, sender and the membership flag are not checked.
pub fn classify_inbound(raw: Option<&Value>) -> Option<RenderEvent> {
    let message = raw?;
    match message.get("type") {
        Some(Value::String(message_type)) if message_type == RENDER_EVENT => {
            Some(RenderEvent::new(message.clone()))
        }
        _ => None,
    }
}

/// The fields a host conventionally puts in a render message.
///
/// Extraction never fails: missing or mistyped fields fall back to defaults
/// and the payload itself is not validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderData {
    /// Named arguments passed by the host application.
    pub args: Map<String, Value>,
    /// Whether the host has disabled the component.
    pub disabled: bool,
    /// Host theme description, if any.
    pub theme: Option<Value>,
}

impl RenderData {
    pub fn from_event(event: &RenderEvent) -> Self {
        let detail = &event.detail;
        Self {
            args: detail
                .get("args")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            disabled: detail
                .get("disabled")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            theme: detail.get("theme").filter(|theme| !theme.is_null()).cloned(),
        }
    }

    /// Look up one named argument.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}
