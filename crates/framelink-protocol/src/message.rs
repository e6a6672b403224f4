//! Protocol constants and message type names.
//!
//! The protocol version is fixed for the lifetime of the process and is
//! advertised, never negotiated.

/// Wire contract version sent with the ready message.
pub const API_VERSION: u32 = 1;

/// Boolean field stamped on every outbound record to mark it as ours.
pub const PROTOCOL_FLAG: &str = "isStreamlitMessage";

/// Host to component: re-render with new arguments.
pub const RENDER_EVENT: &str = "streamlit:render";

/// Component to host: initialized and ready for render events.
pub const COMPONENT_READY: &str = "componentReady";

/// Component to host: resize the frame.
pub const SET_FRAME_HEIGHT: &str = "setFrameHeight";

/// Component to host: deliver the component's output value.
pub const SET_COMPONENT_VALUE: &str = "setComponentValue";

/// Direction-aware classification of a message `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ComponentReady,
    SetFrameHeight,
    SetComponentValue,
    Render,
}

impl MessageKind {
    /// The `type` string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::ComponentReady => COMPONENT_READY,
            MessageKind::SetFrameHeight => SET_FRAME_HEIGHT,
            MessageKind::SetComponentValue => SET_COMPONENT_VALUE,
            MessageKind::Render => RENDER_EVENT,
        }
    }

    /// True for the messages the component sends to its host.
    pub fn is_outbound(self) -> bool {
        !matches!(self, MessageKind::Render)
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a wire `type` string. Anything outside the protocol is `None`.
pub fn message_kind(message_type: &str) -> Option<MessageKind> {
    match message_type {
        COMPONENT_READY => Some(MessageKind::ComponentReady),
        SET_FRAME_HEIGHT => Some(MessageKind::SetFrameHeight),
        SET_COMPONENT_VALUE => Some(MessageKind::SetComponentValue),
        RENDER_EVENT => Some(MessageKind::Render),
        _ => None,
    }
}
