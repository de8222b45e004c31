use bytes::{BufMut, BytesMut};

/// CRC-16 generator polynomial (CCITT).
pub const CRC_POLY: u16 = 0x1021;

/// CRC register seed.
pub const CRC_INIT: u16 = 0xFFFF;

/// Compute the protocol CRC-16 over `data`.
///
/// Bitwise, MSB-first: each input bit is compared with the bit shifted out
/// of the register and the polynomial is applied when they differ. An empty
/// input yields [`CRC_INIT`].
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRC_INIT;
    for &byte in data {
        for bit in (0..8).rev() {
            let input = (byte >> bit) & 1 == 1;
            let top = crc & 0x8000 != 0;
            crc <<= 1;
            if input != top {
                crc ^= CRC_POLY;
            }
        }
    }
    crc
}

/// Append the salted CRC to `payload`.
///
/// The checksum covers `payload || client_id (u32 BE)`; only the payload and
/// the 2-byte big-endian CRC are emitted.
pub fn append_crc(payload: &[u8], client_id: u32) -> BytesMut {
    let mut salted = Vec::with_capacity(payload.len() + 4);
    salted.extend_from_slice(payload);
    salted.extend_from_slice(&client_id.to_be_bytes());

    let mut out = BytesMut::with_capacity(payload.len() + 2);
    out.put_slice(payload);
    out.put_u16(crc16(&salted));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_seed() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn matches_ccitt_false_check_value() {
        // CRC-16/CCITT-FALSE shares poly and seed; its check value applies.
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn deterministic_and_input_sensitive() {
        let data = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(crc16(&data), crc16(&data));
        assert_ne!(crc16(&[0x00]), crc16(&[0x01]));
    }

    #[test]
    fn append_crc_keeps_payload_and_salts_with_client_id() {
        let payload = [0x01, 0x02, 0x03];
        let client_id = 0x1234;

        let out = append_crc(&payload, client_id);
        assert_eq!(out.len(), payload.len() + 2);
        assert_eq!(&out[..3], &payload);

        let expected = crc16(&[0x01, 0x02, 0x03, 0x00, 0x00, 0x12, 0x34]);
        assert_eq!(&out[3..], &expected.to_be_bytes());
    }

    #[test]
    fn different_client_ids_change_trailer() {
        let payload = [0x05, 0x07, 0x00];
        assert_ne!(append_crc(&payload, 1), append_crc(&payload, 2));
    }
}
