//! Protocol driver for Mira SoakStation shower and bath controllers.
//!
//! # Crate Structure
//!
//! - [`transport`] — Link abstraction and in-memory loopback
//! - [`frame`] — CRC, outbound framing, chunking and inbound reassembly
//! - [`protocol`] — Typed commands and notification decoding
//! - [`session`] — Session task, pairing and device model (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use soakstation_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use soakstation_frame::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use soakstation_protocol::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use soakstation_session::*;
}
