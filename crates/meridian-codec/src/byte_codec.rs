use crate::error::DecodeError;
use std::collections::{BTreeMap, BTreeSet};

/// Deterministic byte encoding. Encoding is total: every value of a type
/// that implements `ByteEncode` has exactly one byte representation.
pub trait ByteEncode {
    fn encode(&self) -> Vec<u8>;
}

/// Deterministic byte decoding paired with `ByteEncode`. Decoding may fail
/// on malformed or insufficient input; on success it returns the decoded
/// value and the unconsumed remainder of the input slice.
pub trait ByteDecode: Sized {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError>;
}

/// Marker for codecs that additionally satisfy the ordering-preservation
/// law: `sign(compare(x, y)) == sign(encode(x) lexcmp encode(y))`.
pub trait OrderedCodec: ByteEncode + ByteDecode + Ord {}

// =============================================================================
// Fixed-width primitives
// =============================================================================

impl ByteEncode for u8 {
    fn encode(&self) -> Vec<u8> {
        vec![*self]
    }
}

impl ByteDecode for u8 {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        match bytes.split_first() {
            Some((b, rest)) => Ok((*b, rest)),
            None => Err(DecodeError::unexpected_end("Byte")),
        }
    }
}
impl OrderedCodec for u8 {}

impl ByteEncode for bool {
    fn encode(&self) -> Vec<u8> {
        vec![if *self { 1 } else { 0 }]
    }
}

impl ByteDecode for bool {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (b, rest) = u8::decode(bytes)?;
        match b {
            0 => Ok((false, rest)),
            1 => Ok((true, rest)),
            other => Err(DecodeError::new(format!("invalid Bool tag {other}"))),
        }
    }
}

/// `Long`: fixed-width big-endian 64-bit integer.
impl ByteEncode for u64 {
    fn encode(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }
}

impl ByteDecode for u64 {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        if bytes.len() < 8 {
            return Err(DecodeError::unexpected_end("Long"));
        }
        let (head, rest) = bytes.split_at(8);
        let mut buf = [0u8; 8];
        buf.copy_from_slice(head);
        Ok((u64::from_be_bytes(buf), rest))
    }
}
impl OrderedCodec for u64 {}

/// Fixed-width big-endian 32-bit integer, used for small counters
/// (e.g. group membership counts) that never need `BigNat`'s
/// arbitrary-precision range.
impl ByteEncode for u32 {
    fn encode(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }
}

impl ByteDecode for u32 {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        if bytes.len() < 4 {
            return Err(DecodeError::unexpected_end("Int"));
        }
        let (head, rest) = bytes.split_at(4);
        let mut buf = [0u8; 4];
        buf.copy_from_slice(head);
        Ok((u32::from_be_bytes(buf), rest))
    }
}
impl OrderedCodec for u32 {}

/// `Instant`: epoch-millisecond timestamp, encoded as a `Long`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(pub u64);

impl Instant {
    pub fn from_epoch_millis(ms: u64) -> Self {
        Instant(ms)
    }

    pub fn epoch_millis(&self) -> u64 {
        self.0
    }
}

impl ByteEncode for Instant {
    fn encode(&self) -> Vec<u8> {
        self.0.encode()
    }
}

impl ByteDecode for Instant {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (ms, rest) = u64::decode(bytes)?;
        Ok((Instant(ms), rest))
    }
}
impl OrderedCodec for Instant {}

/// Raw byte string with the identity ordered encoding: `encode(bs) == bs`.
/// Since it carries no self-delimiting length prefix, a `ByteVector` may
/// only appear as the last field of a derived product (it consumes the
/// entire remainder on decode).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteVector(pub Vec<u8>);

impl ByteEncode for ByteVector {
    fn encode(&self) -> Vec<u8> {
        self.0.clone()
    }
}

impl ByteDecode for ByteVector {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        Ok((ByteVector(bytes.to_vec()), &bytes[bytes.len()..]))
    }
}
impl OrderedCodec for ByteVector {}

// =============================================================================
// Derivation for `Option<T>`, `Vec<T>`, tuples, sets and maps
// =============================================================================

impl<T: ByteEncode> ByteEncode for Option<T> {
    fn encode(&self) -> Vec<u8> {
        match self {
            None => vec![0x00],
            Some(t) => {
                let mut out = vec![0x01];
                out.extend(t.encode());
                out
            }
        }
    }
}

impl<T: ByteDecode> ByteDecode for Option<T> {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (tag, rest) = u8::decode(bytes)?;
        match tag {
            0x00 => Ok((None, rest)),
            0x01 => {
                let (t, rest) = T::decode(rest).map_err(|e| DecodeError::wrap("Option", e))?;
                Ok((Some(t), rest))
            }
            other => Err(DecodeError::new(format!("invalid Option tag {other}"))),
        }
    }
}

impl<A: ByteEncode, B: ByteEncode> ByteEncode for (A, B) {
    fn encode(&self) -> Vec<u8> {
        let mut out = self.0.encode();
        out.extend(self.1.encode());
        out
    }
}

impl<A: ByteDecode, B: ByteDecode> ByteDecode for (A, B) {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (a, rest) = A::decode(bytes).map_err(|e| DecodeError::wrap("tuple.0", e))?;
        let (b, rest) = B::decode(rest).map_err(|e| DecodeError::wrap("tuple.1", e))?;
        Ok(((a, b), rest))
    }
}

/// Lists encode as `BigNat(len) ++ concat(encode(items))`. Length is
/// encoded with the plain `u64` length prefix at this layer; callers that
/// need the canonical `BigNat`-prefixed form go through
/// `meridian-primitives::BigNat` directly (this crate has no dependency on
/// it to avoid a cycle).
impl<T: ByteEncode> ByteEncode for Vec<T> {
    fn encode(&self) -> Vec<u8> {
        let mut out = (self.len() as u64).encode();
        for item in self {
            out.extend(item.encode());
        }
        out
    }
}

impl<T: ByteDecode> ByteDecode for Vec<T> {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (len, mut rest) = u64::decode(bytes).map_err(|e| DecodeError::wrap("List.len", e))?;
        let mut items = Vec::with_capacity(len as usize);
        for i in 0..len {
            let (item, next) =
                T::decode(rest).map_err(|e| DecodeError::wrap(&format!("List[{i}]"), e))?;
            items.push(item);
            rest = next;
        }
        Ok((items, rest))
    }
}

/// Sets encode their elements sorted by encoded byte representation,
/// ensuring determinism regardless of in-memory iteration order.
impl<T: ByteEncode + Ord> ByteEncode for BTreeSet<T> {
    fn encode(&self) -> Vec<u8> {
        let mut encoded: Vec<Vec<u8>> = self.iter().map(|t| t.encode()).collect();
        encoded.sort();
        let mut out = (encoded.len() as u64).encode();
        for e in encoded {
            out.extend(e);
        }
        out
    }
}

impl<T: ByteDecode + Ord> ByteDecode for BTreeSet<T> {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (items, rest) = Vec::<T>::decode(bytes)?;
        Ok((items.into_iter().collect(), rest))
    }
}

impl<K: ByteEncode + Ord, V: ByteEncode> ByteEncode for BTreeMap<K, V> {
    fn encode(&self) -> Vec<u8> {
        let mut encoded: Vec<Vec<u8>> = self
            .iter()
            .map(|(k, v)| {
                let mut e = k.encode();
                e.extend(v.encode());
                e
            })
            .collect();
        encoded.sort();
        let mut out = (encoded.len() as u64).encode();
        for e in encoded {
            out.extend(e);
        }
        out
    }
}

impl<K: ByteDecode + Ord, V: ByteDecode> ByteDecode for BTreeMap<K, V> {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (pairs, rest) = Vec::<(K, V)>::decode(bytes)?;
        Ok((pairs.into_iter().collect(), rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: ByteEncode + ByteDecode + PartialEq + std::fmt::Debug>(value: T) {
        let bytes = value.encode();
        let (decoded, rest) = T::decode(&bytes).expect("decode must succeed");
        assert!(rest.is_empty());
        assert_eq!(decoded, value);
    }

    #[test]
    fn option_roundtrip() {
        roundtrip::<Option<u64>>(None);
        roundtrip::<Option<u64>>(Some(42));
    }

    #[test]
    fn list_roundtrip() {
        roundtrip::<Vec<u8>>(vec![1, 2, 3]);
        roundtrip::<Vec<u8>>(vec![]);
    }

    #[test]
    fn u32_roundtrip_and_ordering() {
        roundtrip(0u32);
        roundtrip(u32::MAX);
        assert!(7u32.encode() < 8u32.encode());
    }

    #[test]
    fn tuple_roundtrip() {
        roundtrip::<(u8, u64)>((7, 1234));
    }

    #[test]
    fn set_is_sorted_regardless_of_insertion_order() {
        let mut a = BTreeSet::new();
        a.insert(3u8);
        a.insert(1u8);
        a.insert(2u8);
        let mut b = BTreeSet::new();
        b.insert(2u8);
        b.insert(3u8);
        b.insert(1u8);
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn byte_vector_consumes_remainder() {
        let (decoded, rest) = ByteVector::decode(&[1, 2, 3]).unwrap();
        assert_eq!(decoded.0, vec![1, 2, 3]);
        assert!(rest.is_empty());
    }
}
