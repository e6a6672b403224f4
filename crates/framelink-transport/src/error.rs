/// Errors that can occur in cross-frame transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The frame is not embedded in a parent context.
    #[error("no parent frame context")]
    NoParent,

    /// An inbound handler is already attached.
    #[error("inbound handler already attached")]
    AlreadyAttached,

    /// The platform rejected the outbound message.
    #[error("failed to post message to parent: {0}")]
    Post(String),

    /// Registering or removing the platform message listener failed.
    #[error("message listener error: {0}")]
    Listener(String),

    /// The message could not be converted into the platform representation.
    #[error("message serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
