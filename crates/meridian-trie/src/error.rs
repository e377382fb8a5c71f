use thiserror::Error;

/// A trie invariant was violated: a missing node in the store, a corrupt
/// encoding, or an impossible structural state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrieError {
    #[error("node store is missing node {hash}")]
    MissingNode { hash: String },

    #[error("corrupt node encoding: {msg}")]
    CorruptEncoding { msg: String },

    #[error("path depth {depth} exceeds configured max_depth {max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },

    #[error("cannot rebase: different base roots")]
    DifferentBase,

    #[error("impossible structural state: {msg}")]
    Invariant { msg: String },
}
