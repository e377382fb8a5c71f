use meridian_codec::ByteEncode;
use sha3::{Digest, Keccak256};
use std::marker::PhantomData;

/// Raw Keccak-256 of an arbitrary byte string.
pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// A 32-byte Keccak-256 digest branded with its source type `T`, so a
/// transaction hash and a block hash cannot be confused at the type level.
/// The brand is erased at runtime; only the byte array is ever compared,
/// stored, or hashed.
pub struct Value<T> {
    bytes: [u8; 32],
    _marker: PhantomData<fn() -> T>,
}

impl<T> Value<T> {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Value {
            bytes,
            _marker: PhantomData,
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.bytes
    }

    /// Reinterprets this hash as branded by a different type. Use only
    /// when the caller has independently established that the bytes are
    /// meaningful under the new brand.
    pub fn rebrand<U>(self) -> Value<U> {
        Value::from_bytes(self.bytes)
    }
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Value<T> {}

impl<T> PartialEq for Value<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}
impl<T> Eq for Value<T> {}

impl<T> std::hash::Hash for Value<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl<T> std::fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash(0x{})", hex::encode(self.bytes))
    }
}

/// `keccak256(encode(t))`, branded by `T`.
pub fn hash<T: ByteEncode>(value: &T) -> Value<T> {
    Value::from_bytes(keccak256(&value.encode()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_string() {
        let digest = keccak256(b"");
        assert_eq!(
            hex::encode(digest),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a47"
        );
    }

    #[test]
    fn keccak_of_known_vector() {
        let digest = keccak256(b"The quick brown fox jumps over the lazy dog");
        assert_eq!(
            hex::encode(digest),
            "4d741b6f1eb29cb2a9b9911c82f56fa8d73b04959d3d9d222895df6c0b28aa1"
        );
    }

    #[test]
    fn value_equality_is_over_bytes_only() {
        struct Tx;
        struct Block;
        let a: Value<Tx> = Value::from_bytes([7u8; 32]);
        let b: Value<Block> = a.rebrand();
        assert_eq!(a.to_bytes(), b.to_bytes());
    }
}
