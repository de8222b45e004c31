//! Wire framing for the SoakStation protocol.
//!
//! Outbound, every command is framed as:
//! - a 1-byte client slot
//! - a 1-byte opcode
//! - a 1-byte argument length followed by the arguments
//! - a 2-byte big-endian CRC-16 salted with the sender's client id
//!
//! and split into 20-byte transport chunks. Inbound, notifications carry a
//! 3-byte header and may spill over several chunks; [`Reassembler`] stitches
//! them back together into complete [`Packet`]s.

pub mod codec;
pub mod crc;
pub mod error;
pub mod reassembly;

pub use codec::{
    chunk, encode_frame, Frame, WireHeader, CRC_SIZE, DEFAULT_CHUNK_SIZE, HEADER_SIZE,
    SLOT_OFFSET,
};
pub use crc::{append_crc, crc16, CRC_INIT, CRC_POLY};
pub use error::{FrameError, Result};
pub use reassembly::{Packet, ReassemblyBuffer, Reassembler};
