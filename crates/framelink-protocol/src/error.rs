/// Errors that can occur while encoding or decoding protocol records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The record is not a JSON object.
    #[error("protocol record must be a JSON object")]
    NotAnObject,

    /// The record lacks `isStreamlitMessage: true`.
    #[error("record is not marked with isStreamlitMessage: true")]
    MissingFlag,

    /// The record's `type` is absent or not an outbound message type.
    #[error("unknown message type '{0}'")]
    UnknownType(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
