use std::cmp::Ordering;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::codec::{WireHeader, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// A complete inbound payload, ready for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Client slot taken from the header (`slot_byte - 0x40`).
    pub client_slot: u8,
    /// Opcode echoed in the header.
    pub opcode: u8,
    /// Declared payload length; always equals `payload.len()`.
    pub payload_length: u8,
    /// Payload bytes without header.
    pub payload: Bytes,
}

/// Partial payload buffered while waiting for continuation chunks.
#[derive(Debug, Clone)]
pub struct ReassemblyBuffer {
    expected_slot: u8,
    expected_opcode: u8,
    expected_length: u8,
    accumulated: BytesMut,
}

impl ReassemblyBuffer {
    /// Client slot of the packet being reassembled.
    pub fn expected_slot(&self) -> u8 {
        self.expected_slot
    }

    /// Declared total payload length.
    pub fn expected_length(&self) -> u8 {
        self.expected_length
    }

    /// Bytes buffered so far.
    pub fn accumulated(&self) -> &[u8] {
        &self.accumulated
    }

    fn into_packet(self) -> Packet {
        Packet {
            client_slot: self.expected_slot,
            opcode: self.expected_opcode,
            payload_length: self.expected_length,
            payload: self.accumulated.freeze(),
        }
    }
}

/// Stitches inbound transport chunks into complete packets.
///
/// Two states: idle (nothing buffered) and assembling (a header announced
/// more payload than its chunk carried). While assembling, every chunk is
/// appended raw; it is never re-parsed as a header. Only one packet can be
/// in flight at a time.
///
/// Pure state transitions, no I/O: feed chunks in arrival order.
#[derive(Debug, Default)]
pub struct Reassembler {
    pending: Option<ReassemblyBuffer>,
}

impl Reassembler {
    /// Create an idle reassembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no partial payload is buffered.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// The partial payload, if one is buffered.
    pub fn pending(&self) -> Option<&ReassemblyBuffer> {
        self.pending.as_ref()
    }

    /// Discard any partial payload and return to idle.
    pub fn reset(&mut self) {
        if let Some(buf) = self.pending.take() {
            debug!(
                expected = buf.expected_length,
                buffered = buf.accumulated.len(),
                "discarding partial payload"
            );
        }
    }

    /// Consume one inbound chunk.
    ///
    /// Returns `Ok(Some(packet))` when a payload is complete, `Ok(None)`
    /// while more chunks are needed. Errors are protocol violations: the
    /// data is dropped and the reassembler is idle again.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<Packet>> {
        match self.pending.take() {
            Some(buf) => self.continue_packet(buf, chunk),
            None => self.start_packet(chunk),
        }
    }

    fn start_packet(&mut self, chunk: &[u8]) -> Result<Option<Packet>> {
        let header = WireHeader::parse(chunk)?;
        let payload = &chunk[HEADER_SIZE..];
        let declared = header.payload_length;

        match payload.len().cmp(&(declared as usize)) {
            Ordering::Less => {
                debug!(
                    expected = declared,
                    received = payload.len(),
                    "starting payload reassembly"
                );
                self.pending = Some(ReassemblyBuffer {
                    expected_slot: header.client_slot(),
                    expected_opcode: header.opcode,
                    expected_length: declared,
                    accumulated: BytesMut::from(payload),
                });
                Ok(None)
            }
            Ordering::Equal => Ok(Some(Packet {
                client_slot: header.client_slot(),
                opcode: header.opcode,
                payload_length: declared,
                payload: Bytes::copy_from_slice(payload),
            })),
            Ordering::Greater => Err(FrameError::LengthMismatch {
                declared,
                actual: payload.len(),
            }),
        }
    }

    fn continue_packet(
        &mut self,
        mut buf: ReassemblyBuffer,
        chunk: &[u8],
    ) -> Result<Option<Packet>> {
        buf.accumulated.extend_from_slice(chunk);
        let declared = buf.expected_length;
        let actual = buf.accumulated.len();

        match actual.cmp(&(declared as usize)) {
            Ordering::Less => {
                self.pending = Some(buf);
                Ok(None)
            }
            Ordering::Equal => {
                debug!(length = declared, "completed payload reassembly");
                Ok(Some(buf.into_packet()))
            }
            Ordering::Greater => Err(FrameError::LengthMismatch { declared, actual }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_dispatches_immediately() {
        let mut engine = Reassembler::new();
        let packet = engine
            .push(&[0x41, 0x07, 0x02, 0x00, 0x05])
            .unwrap()
            .unwrap();

        assert!(engine.is_idle());
        assert_eq!(packet.client_slot, 1);
        assert_eq!(packet.opcode, 0x07);
        assert_eq!(packet.payload_length, 2);
        assert_eq!(packet.payload.as_ref(), &[0x00, 0x05]);
    }

    #[test]
    fn two_chunks_reassemble_into_one_packet() {
        let mut engine = Reassembler::new();

        let first = engine
            .push(&[0x42, 0x07, 10, 1, 2, 3, 4, 5])
            .unwrap();
        assert!(first.is_none());
        assert!(!engine.is_idle());
        let pending = engine.pending().unwrap();
        assert_eq!(pending.expected_slot(), 2);
        assert_eq!(pending.expected_length(), 10);
        assert_eq!(pending.accumulated(), &[1, 2, 3, 4, 5]);

        let packet = engine.push(&[6, 7, 8, 9, 10]).unwrap().unwrap();
        assert!(engine.is_idle());
        assert_eq!(packet.client_slot, 2);
        assert_eq!(packet.payload_length, 10);
        assert_eq!(packet.payload.as_ref(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn continuation_is_not_parsed_as_header() {
        let mut engine = Reassembler::new();
        engine.push(&[0x40, 0x32, 4, 0xAA]).unwrap();

        // Looks like a header but is raw continuation data.
        let packet = engine.push(&[0x41, 0x07, 0x0A]).unwrap().unwrap();
        assert_eq!(packet.payload.as_ref(), &[0xAA, 0x41, 0x07, 0x0A]);
    }

    #[test]
    fn three_chunk_payload_stays_assembling() {
        let mut engine = Reassembler::new();
        let mut first = vec![0x41, 0x30, 24];
        first.extend_from_slice(&[0u8; 17]);

        assert!(engine.push(&first).unwrap().is_none());
        assert!(engine.push(&[1, 2, 3]).unwrap().is_none());
        assert!(!engine.is_idle());

        let packet = engine.push(&[4, 5, 6, 7]).unwrap().unwrap();
        assert_eq!(packet.payload.len(), 24);
        assert!(engine.is_idle());
    }

    #[test]
    fn short_chunk_is_dropped() {
        let mut engine = Reassembler::new();
        let err = engine.push(&[0x41, 0x07]).unwrap_err();
        assert_eq!(err, FrameError::HeaderTooShort { len: 2 });
        assert!(engine.is_idle());
    }

    #[test]
    fn oversized_single_chunk_is_dropped() {
        let mut engine = Reassembler::new();
        let err = engine.push(&[0x41, 0x07, 1, 0xAA, 0xBB]).unwrap_err();
        assert_eq!(
            err,
            FrameError::LengthMismatch {
                declared: 1,
                actual: 2
            }
        );
        assert!(engine.is_idle());
    }

    #[test]
    fn overflowing_continuation_resets() {
        let mut engine = Reassembler::new();
        engine.push(&[0x41, 0x07, 4, 1, 2]).unwrap();

        let err = engine.push(&[3, 4, 5]).unwrap_err();
        assert_eq!(
            err,
            FrameError::LengthMismatch {
                declared: 4,
                actual: 5
            }
        );
        assert!(engine.is_idle());

        let packet = engine.push(&[0x41, 0x07, 1, 0x01]).unwrap().unwrap();
        assert_eq!(packet.payload.as_ref(), &[0x01]);
    }

    #[test]
    fn reset_discards_partial_payload() {
        let mut engine = Reassembler::new();
        engine.push(&[0x41, 0x07, 10, 1]).unwrap();
        engine.reset();
        assert!(engine.is_idle());

        let packet = engine.push(&[0x41, 0x07, 1, 0x01]).unwrap().unwrap();
        assert_eq!(packet.payload_length, 1);
    }

    #[test]
    fn empty_payload_dispatches() {
        let mut engine = Reassembler::new();
        let packet = engine.push(&[0x41, 0x07, 0]).unwrap().unwrap();
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn slot_below_offset_wraps() {
        let mut engine = Reassembler::new();
        let packet = engine.push(&[0x3F, 0x07, 0]).unwrap().unwrap();
        assert_eq!(packet.client_slot, 0xFF);
    }
}
