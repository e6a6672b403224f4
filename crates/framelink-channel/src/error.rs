/// Errors that can occur in channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] framelink_transport::TransportError),

    /// Protocol encoding error.
    #[error("protocol error: {0}")]
    Protocol(#[from] framelink_protocol::ProtocolError),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
