use std::fmt;

use soakstation_frame::FrameError;
use soakstation_protocol::ProtocolError;

pub const SUCCESS: i32 = 0;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn hex_error(context: &str, err: hex::FromHexError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::ArgsTooLong { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn protocol_error(context: &str, err: ProtocolError) -> CliError {
    match err {
        ProtocolError::ClientNameTooLong { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        ProtocolError::Frame(err) => frame_error(context, err),
    }
}

pub fn json_error(context: &str, err: serde_json::Error) -> CliError {
    CliError::new(INTERNAL, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_client_name_is_a_usage_error() {
        let err = protocol_error("encode", ProtocolError::ClientNameTooLong { len: 25 });
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("25 bytes"));
    }

    #[test]
    fn malformed_frames_are_invalid_data() {
        let err = frame_error("decode", FrameError::HeaderTooShort { len: 2 });
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn unserializable_output_is_internal() {
        let err = json_error("render", serde_json::from_str::<u8>("x").unwrap_err());
        assert_eq!(err.code, INTERNAL);
    }
}
