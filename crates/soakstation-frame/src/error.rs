/// Errors that can occur during frame encoding and reassembly.
///
/// Everything raised while reassembling inbound chunks is a protocol
/// violation: the offending data is dropped and the engine stays usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A new packet started with fewer bytes than the 3-byte header.
    #[error("chunk too short for header ({len} bytes, need 3)")]
    HeaderTooShort { len: usize },

    /// The received payload is longer than the header declared.
    #[error("payload length mismatch (declared {declared}, received {actual})")]
    LengthMismatch { declared: u8, actual: usize },

    /// Frame arguments do not fit the 1-byte length field.
    #[error("frame arguments too long ({len} bytes, max 255)")]
    ArgsTooLong { len: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
