//! Component-side message channel.
//!
//! This is the layer an embedded component talks to. Announce readiness,
//! report the frame height, emit values, and subscribe to the host's render
//! events:
//!
//! ```
//! use framelink_channel::MessageChannel;
//! use framelink_transport::{FixedHeightProbe, MemoryTransport};
//!
//! let transport = MemoryTransport::new();
//! let channel = MessageChannel::init(transport.clone(), FixedHeightProbe::default()).unwrap();
//!
//! channel.events().on_render(|event| println!("render: {}", event.detail));
//! channel.announce_ready();
//! channel.report_height(Some(150.0));
//!
//! assert_eq!(transport.sent().len(), 2);
//! ```
//!
//! The public outbound operations never fail. A missing parent frame or a
//! rejected post is swallowed, optionally reported through
//! [`ChannelConfig::diagnostics`].

pub mod channel;
pub mod config;
pub mod error;
pub mod events;
#[cfg(feature = "async")]
pub mod stream;

pub use channel::MessageChannel;
pub use config::{ChannelConfig, Diagnostic, DiagnosticHook};
pub use error::{ChannelError, Result};
pub use events::{EventStream, ListenerId};
#[cfg(feature = "async")]
pub use stream::RenderEvents;
