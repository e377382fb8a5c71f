use thiserror::Error;

/// Failures specific to account and group transaction processing, as
/// distinct from the lower-level table/trie failures `SigilError`
/// already covers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("account {name:?} already exists")]
    DuplicateAccount { name: String },

    #[error("no account named {name:?}")]
    AccountNotFound { name: String },

    #[error("no group named {name:?}")]
    GroupNotFound { name: String },

    #[error("group {name:?} already exists")]
    DuplicateGroup { name: String },

    #[error("key is not registered to this account")]
    UnregisteredKey,

    #[error("key registration expired")]
    ExpiredKey,

    #[error("signer is not authorized for this mutation")]
    Unauthorized,

    #[error("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("group {name:?} still has {remaining} member(s)")]
    GroupNotEmpty { name: String, remaining: u32 },

    #[error("self-registration must be signed by the key being registered as owner")]
    OwnerKeyMismatch,
}

impl From<AccountError> for meridian_state::SigilError {
    fn from(e: AccountError) -> Self {
        meridian_state::SigilError::other(e.to_string())
    }
}
