use meridian_codec::{ByteDecode, ByteEncode, DecodeError, OrderedCodec};
use num_bigint::BigUint;
use num_traits::Zero;
use std::cmp::Ordering;
use thiserror::Error;

/// Failure returned by `BigNat` subtraction when the subtrahend exceeds the
/// minuend (the only fallible `BigNat` arithmetic operation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("BigNat subtraction underflow: {minuend} - {subtrahend}")]
pub struct BigNatUnderflow {
    pub minuend: String,
    pub subtrahend: String,
}

/// A non-negative arbitrary-precision integer with a self-delimiting,
/// order-preserving byte encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BigNat(BigUint);

impl BigNat {
    pub fn zero() -> Self {
        BigNat(BigUint::zero())
    }

    pub fn from_u64(n: u64) -> Self {
        BigNat(BigUint::from(n))
    }

    pub fn from_usize(n: usize) -> Self {
        BigNat(BigUint::from(n))
    }

    pub fn to_u64(&self) -> Option<u64> {
        use num_traits::ToPrimitive;
        self.0.to_u64()
    }

    pub fn to_usize(&self) -> Option<usize> {
        use num_traits::ToPrimitive;
        self.0.to_usize()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: &BigNat) -> BigNat {
        BigNat(&self.0 + &other.0)
    }

    pub fn mul(&self, other: &BigNat) -> BigNat {
        BigNat(&self.0 * &other.0)
    }

    pub fn div_rem(&self, other: &BigNat) -> (BigNat, BigNat) {
        let q = &self.0 / &other.0;
        let r = &self.0 % &other.0;
        (BigNat(q), BigNat(r))
    }

    /// Fallible subtraction: fails when `other > self` rather than
    /// silently wrapping, preserving the `n >= 0` invariant.
    pub fn sub(&self, other: &BigNat) -> Result<BigNat, BigNatUnderflow> {
        if other.0 > self.0 {
            return Err(BigNatUnderflow {
                minuend: self.0.to_string(),
                subtrahend: other.0.to_string(),
            });
        }
        Ok(BigNat(&self.0 - &other.0))
    }

    pub fn to_decimal_string(&self) -> String {
        self.0.to_string()
    }

    pub fn from_decimal_str(s: &str) -> Result<Self, DecodeError> {
        s.parse::<BigUint>()
            .map(BigNat)
            .map_err(|e| DecodeError::new(format!("invalid BigNat decimal '{s}': {e}")))
    }

    /// Canonical, leading-zero-free magnitude bytes. Zero is the single
    /// byte `0x00`.
    fn magnitude_bytes(&self) -> Vec<u8> {
        if self.0.is_zero() {
            vec![0u8]
        } else {
            self.0.to_bytes_be()
        }
    }

    fn encode_len(len: usize) -> Vec<u8> {
        if len < 0xFF {
            vec![len as u8]
        } else {
            let mut out = vec![0xFF];
            out.extend((len as u32).to_be_bytes());
            out
        }
    }

    fn decode_len(bytes: &[u8]) -> Result<(usize, &[u8]), DecodeError> {
        let (marker, rest) = bytes
            .split_first()
            .ok_or_else(|| DecodeError::unexpected_end("BigNat.len"))?;
        if *marker < 0xFF {
            Ok((*marker as usize, rest))
        } else {
            if rest.len() < 4 {
                return Err(DecodeError::unexpected_end("BigNat.len (extended)"));
            }
            let (len_bytes, rest) = rest.split_at(4);
            let mut buf = [0u8; 4];
            buf.copy_from_slice(len_bytes);
            Ok((u32::from_be_bytes(buf) as usize, rest))
        }
    }
}

impl PartialOrd for BigNat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigNat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl ByteEncode for BigNat {
    fn encode(&self) -> Vec<u8> {
        let magnitude = self.magnitude_bytes();
        let mut out = Self::encode_len(magnitude.len());
        out.extend(magnitude);
        out
    }
}

impl ByteDecode for BigNat {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (len, rest) = Self::decode_len(bytes)?;
        if rest.len() < len {
            return Err(DecodeError::unexpected_end("BigNat.magnitude"));
        }
        let (magnitude, rest) = rest.split_at(len);
        if len == 0 {
            return Err(DecodeError::new("BigNat magnitude must not be empty"));
        }
        if magnitude[0] == 0 && len > 1 {
            return Err(DecodeError::new(
                "BigNat magnitude has a non-canonical leading zero",
            ));
        }
        Ok((BigNat(BigUint::from_bytes_be(magnitude)), rest))
    }
}

impl OrderedCodec for BigNat {}
