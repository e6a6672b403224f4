//! Cross-frame transport abstraction.
//!
//! Provides a unified interface over the platform mechanism an embedded
//! component uses to talk to its host frame:
//! - posting structured records to the parent context
//! - receiving the parent's messages through a single inbound handler
//! - probing the document for its scrollable content height
//!
//! This is the lowest layer of framelink. The browser implementation lives in
//! `framelink-wasm`; [`MemoryTransport`] and [`FixedHeightProbe`] stand in for
//! it in tests and non-DOM hosts.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::{FixedHeightProbe, MemoryTransport};
pub use traits::{FrameTransport, HeightProbe, InboundHandler};
