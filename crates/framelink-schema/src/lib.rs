//! Optional JSON Schema validation for component/host message payloads.
//!
//! The message channel passes render arguments and component values through
//! untouched. This crate gives the code on either side of the frame boundary
//! a place to check those payloads against JSON Schema 2020-12 documents,
//! keyed by message type.

pub mod config;
pub mod error;
pub mod registry;
pub mod validator;

pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use registry::{validation_target, SchemaRegistry};
