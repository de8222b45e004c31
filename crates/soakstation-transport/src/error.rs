/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The operation requires an established connection.
    #[error("transport not connected")]
    NotConnected,

    /// Failed to establish a connection to the device.
    #[error("failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// Writing a chunk to the device failed.
    #[error("failed to write chunk: {0}")]
    Write(String),

    /// Reading a characteristic failed.
    #[error("failed to read characteristic {uuid}: {reason}")]
    Read { uuid: String, reason: String },

    /// The characteristic is not exposed by the device.
    #[error("unknown characteristic {0}")]
    UnknownCharacteristic(String),

    /// The transport has been closed and can no longer be used.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
