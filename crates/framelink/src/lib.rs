//! Messaging bridge between an embedded component and its host frame.
//!
//! A component running inside a frame announces readiness, reports its
//! height, emits output values, and receives render instructions from the
//! host page. framelink speaks that wire contract over any transport.
//!
//! # Crate Structure
//!
//! - [`transport`]: platform seam (post to parent, inbound handler, height probes)
//! - [`protocol`]: wire records, inbound filtering, height resolution
//! - [`channel`]: the component-side message channel and render event stream
//!   (behind the default `channel` feature)
//! - [`schema`]: optional JSON Schema validation of payloads (behind `schema`)
//!
//! The browser binding lives in the `framelink-wasm` crate.

/// Re-export transport types.
pub mod transport {
    pub use framelink_transport::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use framelink_protocol::*;
}

/// Re-export channel types (requires `channel` feature).
#[cfg(feature = "channel")]
pub mod channel {
    pub use framelink_channel::*;
}

/// Re-export schema types (requires `schema` feature).
#[cfg(feature = "schema")]
pub mod schema {
    pub use framelink_schema::*;
}
