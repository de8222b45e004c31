//! Temperatures travel as big-endian `u16` tenths of a degree Celsius.

/// Highest encodable temperature in °C.
pub const MAX_TEMPERATURE: f64 = u16::MAX as f64 / 10.0;

/// Encode °C into device units, clamping to `[0, 6553.5]`.
pub fn encode_temperature(celsius: f64) -> [u8; 2] {
    let tenths = (celsius * 10.0).round();
    let tenths = if tenths.is_nan() {
        0.0
    } else {
        tenths.clamp(0.0, u16::MAX as f64)
    };
    (tenths as u16).to_be_bytes()
}

/// Decode device units into °C.
pub fn decode_temperature(raw: [u8; 2]) -> f64 {
    u16::from_be_bytes(raw) as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_within_a_tenth() {
        for t in [0.0, 25.5, 38.0, 45.7, 99.9] {
            let back = decode_temperature(encode_temperature(t));
            assert!((back - t).abs() < 0.1, "{t} decoded as {back}");
        }
    }

    #[test]
    fn encodes_big_endian_tenths() {
        assert_eq!(encode_temperature(38.5), [0x01, 0x81]);
        assert_eq!(decode_temperature([0x01, 0x81]), 38.5);
    }

    #[test]
    fn clamps_out_of_range_input() {
        assert_eq!(decode_temperature(encode_temperature(-10.0)), 0.0);
        assert_eq!(decode_temperature(encode_temperature(1000.0)), 1000.0);
        assert_eq!(decode_temperature(encode_temperature(7000.0)), MAX_TEMPERATURE);
        assert_eq!(encode_temperature(f64::NAN), [0, 0]);
    }
}
