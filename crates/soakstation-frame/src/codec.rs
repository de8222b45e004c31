use bytes::{BufMut, Bytes, BytesMut};

use crate::crc::append_crc;
use crate::error::{FrameError, Result};

/// Header: slot (1) + opcode (1) + length (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Trailer: big-endian CRC-16.
pub const CRC_SIZE: usize = 2;

/// Inbound slot bytes are offset by this value from the client slot.
pub const SLOT_OFFSET: u8 = 0x40;

/// Maximum bytes per transport chunk (BLE ATT payload).
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// A logical outbound command before CRC and chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Client slot the frame is sent from.
    pub target_slot: u8,
    /// Command opcode.
    pub opcode: u8,
    /// Command arguments (at most 255 bytes).
    args: Bytes,
}

impl Frame {
    /// Create a frame, rejecting arguments that overflow the length byte.
    pub fn new(target_slot: u8, opcode: u8, args: impl Into<Bytes>) -> Result<Self> {
        let args = args.into();
        if args.len() > u8::MAX as usize {
            return Err(FrameError::ArgsTooLong { len: args.len() });
        }
        Ok(Self {
            target_slot,
            opcode,
            args,
        })
    }

    /// Create a frame without arguments.
    pub fn bare(target_slot: u8, opcode: u8) -> Self {
        Self {
            target_slot,
            opcode,
            args: Bytes::new(),
        }
    }

    /// Command arguments.
    pub fn args(&self) -> &[u8] {
        &self.args
    }

    /// Value of the argument length byte.
    pub fn arg_length(&self) -> u8 {
        self.args.len() as u8
    }

    /// Total wire size including header and CRC trailer.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.args.len() + CRC_SIZE
    }

    /// Encode into a CRC-terminated buffer salted with `client_id`.
    pub fn encode(&self, client_id: u32) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_frame(self, client_id, &mut dst);
        dst.freeze()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────┬─────────────┬───────────────┐
/// │ Slot     │ Opcode   │ Arg len  │ Args         │ CRC-16 (2B BE)│
/// │ (1B)     │ (1B)     │ (1B)     │ (len bytes)  │               │
/// └──────────┴──────────┴──────────┴─────────────┴───────────────┘
/// ```
pub fn encode_frame(frame: &Frame, client_id: u32, dst: &mut BytesMut) {
    let mut body = BytesMut::with_capacity(HEADER_SIZE + frame.args.len());
    body.put_u8(frame.target_slot);
    body.put_u8(frame.opcode);
    body.put_u8(frame.arg_length());
    body.put_slice(&frame.args);
    dst.put(append_crc(&body, client_id));
}

/// Split `data` into consecutive slices of at most `chunk_size` bytes.
///
/// Order is preserved; only the final slice may be shorter. Empty input
/// yields no chunks. A `chunk_size` of zero is treated as one.
pub fn chunk(data: &[u8], chunk_size: usize) -> Vec<&[u8]> {
    data.chunks(chunk_size.max(1)).collect()
}

/// Header fields of an inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    /// Raw slot byte (`client_slot + 0x40`).
    pub slot_byte: u8,
    /// Opcode echoed by the device.
    pub opcode: u8,
    /// Declared total payload size, possibly spanning several chunks.
    pub payload_length: u8,
}

impl WireHeader {
    /// Parse the first 3 bytes of a chunk.
    pub fn parse(data: &[u8]) -> Result<Self> {
        match data {
            [slot_byte, opcode, payload_length, ..] => Ok(Self {
                slot_byte: *slot_byte,
                opcode: *opcode,
                payload_length: *payload_length,
            }),
            _ => Err(FrameError::HeaderTooShort { len: data.len() }),
        }
    }

    /// Client slot the packet is addressed to.
    pub fn client_slot(&self) -> u8 {
        self.slot_byte.wrapping_sub(SLOT_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc16;

    #[test]
    fn encodes_header_args_and_crc() {
        let frame = Frame::new(3, 0x30, vec![0x42]).unwrap();
        let wire = frame.encode(0xDEAD_BEEF);

        assert_eq!(wire.len(), frame.wire_size());
        assert_eq!(&wire[..4], &[3, 0x30, 1, 0x42]);

        let crc = crc16(&[3, 0x30, 1, 0x42, 0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(&wire[4..], &crc.to_be_bytes());
    }

    #[test]
    fn bare_frame_has_zero_length() {
        let frame = Frame::bare(1, 0x07);
        let wire = frame.encode(1);
        assert_eq!(&wire[..3], &[1, 0x07, 0]);
        assert_eq!(wire.len(), 5);
    }

    #[test]
    fn rejects_oversized_args() {
        let err = Frame::new(0, 0x01, vec![0u8; 256]).unwrap_err();
        assert_eq!(err, FrameError::ArgsTooLong { len: 256 });
    }

    #[test]
    fn chunking_preserves_data() {
        let data: Vec<u8> = (1..=8).collect();

        assert_eq!(
            chunk(&data, 3),
            vec![&[1u8, 2, 3][..], &[4u8, 5, 6][..], &[7u8, 8][..]]
        );
        assert_eq!(chunk(&data, 4).len(), 2);
        assert_eq!(chunk(&data, 10), vec![&data[..]]);
        assert_eq!(chunk(&data, 1).len(), 8);
        assert!(chunk(&[], 20).is_empty());
    }

    #[test]
    fn chunks_are_full_except_last() {
        let data = vec![0xAB; 45];
        let parts = chunk(&data, DEFAULT_CHUNK_SIZE);

        assert_eq!(parts.len(), 3);
        assert!(parts[..2].iter().all(|c| c.len() == DEFAULT_CHUNK_SIZE));
        assert_eq!(parts[2].len(), 5);
        assert_eq!(parts.concat(), data);
    }

    #[test]
    fn parses_header() {
        let header = WireHeader::parse(&[0x43, 0x07, 0x0A, 0xFF]).unwrap();
        assert_eq!(header.client_slot(), 3);
        assert_eq!(header.opcode, 0x07);
        assert_eq!(header.payload_length, 10);
    }

    #[test]
    fn short_header_rejected() {
        let err = WireHeader::parse(&[0x41, 0x07]).unwrap_err();
        assert_eq!(err, FrameError::HeaderTooShort { len: 2 });
    }
}
