use crate::bignat::BigNat;
use meridian_codec::{ByteDecode, ByteEncode, DecodeError};
use num_bigint::{BigInt, Sign};
use num_traits::Zero;

/// Signed arbitrary-precision integer. Encoding is sign-aware and
/// self-delimiting; the encoding of zero is unique, so positive and
/// negative zero cannot both appear.
///
/// Not an `OrderedCodec`: signed `BigInt` is excluded from the
/// ordering-preservation law, since two's-complement-style sign
/// handling would break lexicographic byte comparison.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BigIntValue(BigInt);

const TAG_ZERO: u8 = 0x00;
const TAG_POSITIVE: u8 = 0x01;
const TAG_NEGATIVE: u8 = 0x02;

impl BigIntValue {
    pub fn zero() -> Self {
        BigIntValue(BigInt::zero())
    }

    pub fn from_i64(n: i64) -> Self {
        BigIntValue(BigInt::from(n))
    }

    pub fn from_decimal_str(s: &str) -> Result<Self, DecodeError> {
        s.parse::<BigInt>()
            .map(BigIntValue)
            .map_err(|e| DecodeError::new(format!("invalid BigInt decimal '{s}': {e}")))
    }

    pub fn to_decimal_string(&self) -> String {
        self.0.to_string()
    }

    pub fn is_negative(&self) -> bool {
        self.0.sign() == Sign::Minus
    }

    pub fn add(&self, other: &BigIntValue) -> BigIntValue {
        BigIntValue(&self.0 + &other.0)
    }

    pub fn sub(&self, other: &BigIntValue) -> BigIntValue {
        BigIntValue(&self.0 - &other.0)
    }

    pub fn mul(&self, other: &BigIntValue) -> BigIntValue {
        BigIntValue(&self.0 * &other.0)
    }

    /// Non-negative projection, used when a value that is statically
    /// known to be non-negative needs to cross into `BigNat`-typed APIs
    /// (e.g. `UInt256::from_unsigned`).
    pub fn to_biguint(&self) -> Option<num_bigint::BigUint> {
        self.0.to_biguint()
    }
}

impl ByteEncode for BigIntValue {
    fn encode(&self) -> Vec<u8> {
        if self.0.is_zero() {
            return vec![TAG_ZERO];
        }
        let (sign, magnitude) = self.0.to_bytes_be();
        let tag = match sign {
            Sign::Plus => TAG_POSITIVE,
            Sign::Minus => TAG_NEGATIVE,
            Sign::NoSign => unreachable!("zero handled above"),
        };
        let mut out = vec![tag];
        out.extend(BigNat::from_usize(magnitude.len()).encode());
        out.extend(magnitude);
        out
    }
}

impl ByteDecode for BigIntValue {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (tag, rest) = bytes
            .split_first()
            .ok_or_else(|| DecodeError::unexpected_end("BigInt.tag"))?;
        match *tag {
            TAG_ZERO => Ok((BigIntValue::zero(), rest)),
            TAG_POSITIVE | TAG_NEGATIVE => {
                let (len, rest) = BigNat::decode(rest)?;
                let len = len
                    .to_usize()
                    .ok_or_else(|| DecodeError::new("BigInt magnitude length too large"))?;
                if rest.len() < len {
                    return Err(DecodeError::unexpected_end("BigInt.magnitude"));
                }
                if len == 0 {
                    return Err(DecodeError::new(
                        "non-zero BigInt tag must carry a non-empty magnitude",
                    ));
                }
                let (magnitude, rest) = rest.split_at(len);
                let sign = if *tag == TAG_POSITIVE {
                    Sign::Plus
                } else {
                    Sign::Minus
                };
                Ok((BigIntValue(BigInt::from_bytes_be(sign, magnitude)), rest))
            }
            other => Err(DecodeError::new(format!("invalid BigInt tag {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(n: BigIntValue) {
        let bytes = n.encode();
        let (decoded, rest) = BigIntValue::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, n);
    }

    #[test]
    fn zero_has_a_unique_encoding() {
        assert_eq!(BigIntValue::zero().encode(), vec![TAG_ZERO]);
        roundtrip(BigIntValue::zero());
    }

    #[test]
    fn positive_and_negative_roundtrip() {
        roundtrip(BigIntValue::from_i64(42));
        roundtrip(BigIntValue::from_i64(-42));
        roundtrip(BigIntValue::from_decimal_str("-123456789012345678901234567890").unwrap());
    }

    #[test]
    fn arithmetic() {
        let a = BigIntValue::from_i64(5);
        let b = BigIntValue::from_i64(-3);
        assert_eq!(a.add(&b), BigIntValue::from_i64(2));
        assert_eq!(a.sub(&b), BigIntValue::from_i64(8));
        assert_eq!(a.mul(&b), BigIntValue::from_i64(-15));
    }
}
