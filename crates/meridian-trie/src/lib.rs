//! Content-addressed, radix-16 Merkle patricia trie with a
//! reference-counted diff layer.
//!
//! Every node's identity is the Keccak-256 hash of its canonical byte
//! encoding. The trie is persistent: `put`/`remove` return a new state
//! (new root plus diff) rather than mutating anything in place.

mod diff;
mod error;
mod node;
mod store;
mod trie;
#[cfg(test)]
mod trie_tests;

pub use diff::MerkleTrieStateDiff;
pub use error::TrieError;
pub use node::{MerkleTrieNode, NodeHash};
pub use store::{InMemoryNodeStore, NodeStore};
pub use trie::{get, put, remove, stream_from, MerkleTrieState, TrieConfig};
