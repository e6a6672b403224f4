/// Errors that can occur during schema validation.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The schema could not be compiled.
    #[error("failed to compile schema: {0}")]
    CompileFailed(String),

    /// The schema targets something other than a protocol message type.
    #[error("unknown message type '{0}'")]
    UnknownMessageType(String),

    /// The payload failed schema validation.
    #[error("validation failed for {message_type}: {message}")]
    ValidationFailed {
        message_type: String,
        message: String,
    },

    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No schema registered for the given message type.
    #[error("no schema registered for {0}")]
    NoSchema(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
