use thiserror::Error;

/// Signature production, recovery, or key derivation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("crypto error: {msg}")]
pub struct CryptoError {
    pub msg: String,
}

impl CryptoError {
    pub fn new(msg: impl Into<String>) -> Self {
        CryptoError { msg: msg.into() }
    }
}
