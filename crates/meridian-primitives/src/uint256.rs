use crate::bigint::BigIntValue;
use meridian_codec::{ByteDecode, ByteEncode, DecodeError, OrderedCodec};
use num_bigint::BigUint;
use thiserror::Error;

/// A fixed 32-byte big-endian value, `0 <= n < 2^256`.
///
/// Equality and hashing are over the 32-byte representation, not over any
/// particular constructor path.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct UInt256([u8; 32]);

/// The union of every way `UInt256` construction can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UInt256Failure {
    #[error("byte sequence too long for UInt256: got {got}, max {max}")]
    TooLong { got: usize, max: usize },
    #[error("value overflows UInt256 (256 bits)")]
    Overflow,
    #[error("value must be non-negative")]
    Negative,
    #[error("invalid hex input: {msg}")]
    InvalidHex { msg: String },
}

impl std::fmt::Debug for UInt256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UInt256(0x{})", self.to_hex())
    }
}

impl UInt256 {
    pub const ZERO: UInt256 = UInt256([0u8; 32]);

    /// Accepts lengths `0..=32`, left-padding with zeros; rejects longer
    /// sequences with `TooLong`.
    pub fn from_bytes_be(bytes: &[u8]) -> Result<Self, UInt256Failure> {
        if bytes.len() > 32 {
            return Err(UInt256Failure::TooLong {
                got: bytes.len(),
                max: 32,
            });
        }
        let mut buf = [0u8; 32];
        buf[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(UInt256(buf))
    }

    pub fn from_u64(n: u64) -> Self {
        Self::from_bytes_be(&n.to_be_bytes()).expect("u64 always fits in 256 bits")
    }

    pub fn from_unsigned(value: &BigIntValue) -> Result<Self, UInt256Failure> {
        if value.is_negative() {
            return Err(UInt256Failure::Negative);
        }
        let magnitude = value
            .to_biguint()
            .expect("non-negative BigIntValue always has a BigUint projection");
        Self::from_biguint(&magnitude)
    }

    pub fn from_biguint(value: &BigUint) -> Result<Self, UInt256Failure> {
        let bytes = value.to_bytes_be();
        if bytes.len() > 32 {
            return Err(UInt256Failure::Overflow);
        }
        Self::from_bytes_be(&bytes)
    }

    /// Accepts an optional `0x` prefix, ASCII whitespace, and `_`
    /// separators.
    pub fn from_hex(s: &str) -> Result<Self, UInt256Failure> {
        let cleaned: String = s
            .trim()
            .trim_start_matches("0x")
            .trim_start_matches("0X")
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect();
        if cleaned.is_empty() {
            return Err(UInt256Failure::InvalidHex {
                msg: "empty hex string".to_string(),
            });
        }
        let padded = if cleaned.len() % 2 == 1 {
            format!("0{cleaned}")
        } else {
            cleaned
        };
        let bytes = hex_decode(&padded).map_err(|msg| UInt256Failure::InvalidHex { msg })?;
        Self::from_bytes_be(&bytes).map_err(|_| UInt256Failure::InvalidHex {
            msg: format!("hex value exceeds 256 bits ({} bytes)", bytes.len()),
        })
    }

    pub fn to_bytes_be(&self) -> [u8; 32] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn to_unsigned(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("odd-length hex string: {s}"));
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for chunk in bytes.chunks(2) {
        let hi = hex_digit(chunk[0])?;
        let lo = hex_digit(chunk[1])?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn hex_digit(c: u8) -> Result<u8, String> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        other => Err(format!("invalid hex digit '{}'", other as char)),
    }
}

impl PartialOrd for UInt256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UInt256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl ByteEncode for UInt256 {
    fn encode(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl ByteDecode for UInt256 {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        if bytes.len() < 32 {
            return Err(DecodeError::unexpected_end("UInt256"));
        }
        let (head, rest) = bytes.split_at(32);
        let mut buf = [0u8; 32];
        buf.copy_from_slice(head);
        Ok((UInt256(buf), rest))
    }
}

impl OrderedCodec for UInt256 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_byte_sequences_are_left_padded() {
        for len in 0..=32 {
            let bytes = vec![0xAB; len];
            let n = UInt256::from_bytes_be(&bytes).unwrap();
            let mut expected = [0u8; 32];
            expected[32 - len..].copy_from_slice(&bytes);
            assert_eq!(n.to_bytes_be(), expected);
        }
    }

    #[test]
    fn too_long_is_rejected() {
        let bytes = vec![1u8; 33];
        assert_eq!(
            UInt256::from_bytes_be(&bytes).unwrap_err(),
            UInt256Failure::TooLong { got: 33, max: 32 }
        );
    }

    #[test]
    fn from_unsigned_rejects_negative() {
        let neg = BigIntValue::from_i64(-1);
        assert_eq!(UInt256::from_unsigned(&neg).unwrap_err(), UInt256Failure::Negative);
    }

    #[test]
    fn from_hex_accepts_prefix_whitespace_and_underscores() {
        let a = UInt256::from_hex("0x00_00_01").unwrap();
        let b = UInt256::from_hex("  1 ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, UInt256::from_u64(1));
    }

    #[test]
    fn encode_decode_roundtrip() {
        let n = UInt256::from_hex("0x1234abcd").unwrap();
        let bytes = n.encode();
        assert_eq!(bytes.len(), 32);
        let (decoded, rest) = UInt256::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, n);
    }

    #[test]
    fn ordering_matches_bytewise_order() {
        let a = UInt256::from_u64(1);
        let b = UInt256::from_u64(2);
        assert!(a < b);
        assert!(a.encode() < b.encode());
    }
}
