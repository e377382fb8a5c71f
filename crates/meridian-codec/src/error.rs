use thiserror::Error;

/// Failure produced by a byte or JSON decoder. Byte and JSON decoding
/// failures carry a diagnostic message; collection decoders fail fast
/// with the offending element's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decode error: {msg}")]
pub struct DecodeError {
    pub msg: String,
}

impl DecodeError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }

    pub fn unexpected_end(what: &str) -> Self {
        Self::new(format!("unexpected end of input while decoding {what}"))
    }

    pub fn wrap(context: &str, inner: DecodeError) -> Self {
        Self::new(format!("{context}: {}", inner.msg))
    }
}
