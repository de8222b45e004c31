use std::time::Duration;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] soakstation_transport::TransportError),

    /// Command could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] soakstation_protocol::ProtocolError),

    /// No response arrived before the deadline.
    #[error("no response after {0:?}")]
    Timeout(Duration),

    /// The command needs a client identity and none is set.
    #[error("session is not paired")]
    NotPaired,

    /// The device answered the pairing request with the failure status.
    #[error("pairing rejected by device")]
    PairingRejected,

    /// A pairing exchange is already waiting for its answer.
    #[error("pairing already in progress")]
    PairingInProgress,

    /// The device answered with something the caller did not expect.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The session task has stopped.
    #[error("session closed")]
    Closed,
}

impl SessionError {
    /// Whether the error came from the link rather than the protocol.
    pub fn is_transport(&self) -> bool {
        matches!(self, SessionError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
