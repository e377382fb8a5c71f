use meridian_codec::{ByteDecode, ByteEncode, DecodeError, OrderedCodec};

/// A UTF-8 string encoded so that byte-lexicographic comparison of the
/// encoding matches `Ord` comparison of the string.
///
/// Escapes every `0x00` byte as `0x00 0xFF` and terminates the whole
/// encoding with `0x00 0x00`. Because `0x00` never occurs as a
/// continuation byte in valid UTF-8 and the terminator sorts before any
/// escaped or literal byte, this keeps the ordering law intact without a
/// length prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Utf8Key(pub String);

const ESCAPE: u8 = 0x00;
const ESCAPED_LITERAL: u8 = 0xFF;
const TERMINATOR: [u8; 2] = [0x00, 0x00];

impl Utf8Key {
    pub fn new(s: impl Into<String>) -> Self {
        Utf8Key(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ByteEncode for Utf8Key {
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.len() + 2);
        for byte in self.0.as_bytes() {
            if *byte == ESCAPE {
                out.push(ESCAPE);
                out.push(ESCAPED_LITERAL);
            } else {
                out.push(*byte);
            }
        }
        out.extend_from_slice(&TERMINATOR);
        out
    }
}

impl ByteDecode for Utf8Key {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let mut decoded = Vec::new();
        let mut i = 0;
        loop {
            if i >= bytes.len() {
                return Err(DecodeError::unexpected_end("Utf8Key (missing terminator)"));
            }
            if bytes[i] == ESCAPE {
                match bytes.get(i + 1) {
                    Some(&ESCAPED_LITERAL) => {
                        decoded.push(ESCAPE);
                        i += 2;
                    }
                    Some(&0x00) => {
                        i += 2;
                        break;
                    }
                    _ => {
                        return Err(DecodeError::new(
                            "Utf8Key: 0x00 not followed by a valid escape or terminator",
                        ))
                    }
                }
            } else {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
        let s = String::from_utf8(decoded)
            .map_err(|e| DecodeError::new(format!("invalid UTF-8 in Utf8Key: {e}")))?;
        Ok((Utf8Key(s), &bytes[i..]))
    }
}

impl OrderedCodec for Utf8Key {}
