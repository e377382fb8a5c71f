use crate::bignat::BigNat;
use meridian_codec::{ByteDecode, ByteEncode, DecodeError};

/// A length-prefixed UTF-8 string: `BigNat(byte_length) ++ utf8_bytes`.
///
/// Not an `OrderedCodec` — the length prefix means two strings sharing a
/// prefix do not compare the same way byte-lexicographically as they do as
/// strings (e.g. `"a"` vs `"aa"`). Use `Utf8Key` when order preservation is
/// required.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Utf8(pub String);

impl Utf8 {
    pub fn new(s: impl Into<String>) -> Self {
        Utf8(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ByteEncode for Utf8 {
    fn encode(&self) -> Vec<u8> {
        let bytes = self.0.as_bytes();
        let mut out = BigNat::from_usize(bytes.len()).encode();
        out.extend_from_slice(bytes);
        out
    }
}

impl ByteDecode for Utf8 {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (len, rest) = BigNat::decode(bytes)?;
        let len = len
            .to_usize()
            .ok_or_else(|| DecodeError::new("Utf8 length too large"))?;
        if rest.len() < len {
            return Err(DecodeError::unexpected_end("Utf8.bytes"));
        }
        let (str_bytes, rest) = rest.split_at(len);
        let s = std::str::from_utf8(str_bytes)
            .map_err(|e| DecodeError::new(format!("invalid UTF-8: {e}")))?;
        Ok((Utf8(s.to_string()), rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_ascii_and_multibyte() {
        for s in ["", "hello", "héllo wörld", "日本語"] {
            let v = Utf8::new(s);
            let bytes = v.encode();
            let (decoded, rest) = Utf8::decode(&bytes).unwrap();
            assert!(rest.is_empty());
            assert_eq!(decoded.as_str(), s);
        }
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut bytes = BigNat::from_usize(1).encode();
        bytes.push(0xFF);
        assert!(Utf8::decode(&bytes).is_err());
    }
}
