//! IEEE-754 float codec (`spec.md` §4.1).
//!
//! `spec.md`'s origin host has no native big-endian float conversion, so it
//! probes host endianness once and byte-swaps manually. Rust's `f32`/`f64`
//! expose `to_bits`/`from_bits`, and integer `to_be_bytes`/`from_be_bytes`
//! are endianness-correct unconditionally — no probe needed (see
//! SPEC_FULL.md §4.1, resolved Open Question). Both approaches produce the
//! same wire bytes; this one just skips the host-layout inspection.

pub fn encode_f32(v: f32) -> [u8; 4] {
    v.to_bits().to_be_bytes()
}

pub fn decode_f32(bytes: [u8; 4]) -> f32 {
    f32::from_bits(u32::from_be_bytes(bytes))
}

pub fn encode_f64(v: f64) -> [u8; 8] {
    v.to_bits().to_be_bytes()
}

pub fn decode_f64(bytes: [u8; 8]) -> f64 {
    f64::from_bits(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_f32_edge_cases() {
        for v in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -0.0f32, 0.0f32, 1.5f32] {
            let decoded = decode_f32(encode_f32(v));
            if v.is_nan() {
                assert!(decoded.is_nan());
            } else {
                assert_eq!(decoded.to_bits(), v.to_bits(), "bit pattern mismatch for {v}");
            }
        }
    }

    #[test]
    fn round_trips_f64_edge_cases() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0f64, 0.0f64, 1.5f64] {
            let decoded = decode_f64(encode_f64(v));
            if v.is_nan() {
                assert!(decoded.is_nan());
            } else {
                assert_eq!(decoded.to_bits(), v.to_bits(), "bit pattern mismatch for {v}");
            }
        }
    }

    #[test]
    fn negative_zero_bit_pattern_preserved() {
        let decoded = decode_f64(encode_f64(-0.0));
        assert!(decoded.is_sign_negative());
    }
}
