//! Browser binding for framelink.
//!
//! [`WindowTransport`] posts to `window.parent` and listens for the window's
//! `message` events; [`DomHeightProbe`] reads the document's scroll heights.
//! [`Component`] exposes the message channel to JavaScript:
//!
//! ```text
//! const component = Component.init();
//! component.onRender((message) => draw(message.args));
//! component.announceReady();
//! component.reportHeight();
//! ```
#![cfg(target_arch = "wasm32")]

mod component;
mod error;
mod transport;

pub use component::{render_event, Component};
pub use transport::{CurrentMessage, DomHeightProbe, WindowTransport};
