use meridian_codec::DecodeError;
use meridian_crypto::CryptoError;
use meridian_primitives::UInt256Failure;
use meridian_trie::TrieError;
use thiserror::Error;

/// The union of every failure kind the library can raise, propagated
/// through the store monad. Named `SigilError` in this crate; the
/// upstream design calls the same union `SigilarisError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigilError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    UInt256(#[from] UInt256Failure),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Trie(#[from] TrieError),

    #[error("{0}")]
    Other(String),
}

impl SigilError {
    pub fn other(msg: impl Into<String>) -> Self {
        SigilError::Other(msg.into())
    }
}
