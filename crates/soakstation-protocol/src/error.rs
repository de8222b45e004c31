use soakstation_frame::FrameError;

/// Errors raised while encoding commands.
///
/// All of these are detected before any byte reaches the transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The UTF-8 client name exceeds the 20-byte field.
    #[error("client name too long ({len} bytes, max 20)")]
    ClientNameTooLong { len: usize },

    /// Frame construction failed.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
