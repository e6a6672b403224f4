//! Wire contract for messages between an embedded component and its host.
//!
//! Every outbound record is a JSON object carrying:
//! - the membership flag `isStreamlitMessage: true`
//! - a `type` string naming one of the three component notifications
//! - the variant's payload field (`apiVersion`, `height` or `value`)
//!
//! Inbound traffic is accepted only when its `type` is the render-event tag.
//! There is no origin or sender check: the component trusts whatever parent
//! embeds it. Reuse in a different trust model has to add its own filtering
//! in front of [`classify_inbound`].

pub mod codec;
pub mod error;
pub mod height;
pub mod inbound;
pub mod message;

pub use codec::{decode_outbound, encode_outbound, OutboundMessage};
pub use error::{ProtocolError, Result};
pub use height::{requested_height, resolve_height};
pub use inbound::{classify_inbound, RenderData, RenderEvent};
pub use message::{
    message_kind, MessageKind, API_VERSION, COMPONENT_READY, PROTOCOL_FLAG, RENDER_EVENT,
    SET_COMPONENT_VALUE, SET_FRAME_HEIGHT,
};
