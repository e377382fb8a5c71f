use crate::error::TrieError;
use crate::node::{MerkleTrieNode, NodeHash};
use meridian_codec::{ByteDecode, ByteEncode};
use std::collections::HashMap;
use std::sync::RwLock;

/// The trie's only dependency: a read-only, content-addressed lookup of
/// nodes by hash. Writes happen by publishing a `MerkleTrieStateDiff`,
/// which is the caller's responsibility, not the store's. Narrowed to
/// the single read capability the trie core actually needs.
pub trait NodeStore: Send + Sync {
    fn get_node(&self, hash: &NodeHash) -> Result<Option<MerkleTrieNode>, TrieError>;
}

/// An in-memory, `HashMap`-backed reference implementation, suitable for
/// tests and for embedding hosts that have not yet wired up their own
/// persistence.
#[derive(Default)]
pub struct InMemoryNodeStore {
    nodes: RwLock<HashMap<[u8; 32], Vec<u8>>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_node(&self, hash: NodeHash, node: &MerkleTrieNode) {
        let mut nodes = self.nodes.write().expect("node store lock poisoned");
        nodes.insert(hash.to_bytes(), node.encode());
    }

    pub fn batch_put<'a>(&self, nodes: impl IntoIterator<Item = (NodeHash, &'a MerkleTrieNode)>) {
        let mut guard = self.nodes.write().expect("node store lock poisoned");
        for (hash, node) in nodes {
            guard.insert(hash.to_bytes(), node.encode());
        }
    }

    pub fn delete_node(&self, hash: &NodeHash) {
        let mut nodes = self.nodes.write().expect("node store lock poisoned");
        nodes.remove(&hash.to_bytes());
    }

    pub fn len(&self) -> usize {
        self.nodes.read().expect("node store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeStore for InMemoryNodeStore {
    fn get_node(&self, hash: &NodeHash) -> Result<Option<MerkleTrieNode>, TrieError> {
        let nodes = self.nodes.read().expect("node store lock poisoned");
        match nodes.get(&hash.to_bytes()) {
            None => Ok(None),
            Some(bytes) => {
                let (node, rest) = MerkleTrieNode::decode(bytes).map_err(|e| {
                    TrieError::CorruptEncoding {
                        msg: format!("node {hash:?}: {e}"),
                    }
                })?;
                if !rest.is_empty() {
                    return Err(TrieError::CorruptEncoding {
                        msg: format!("node {hash:?} has trailing bytes"),
                    });
                }
                Ok(Some(node))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_primitives::Nibbles;

    #[test]
    fn round_trips_through_encode_decode() {
        let node = MerkleTrieNode::Leaf {
            prefix: Nibbles::from_nibbles(vec![1, 2]),
            value: b"v".to_vec(),
        };
        let hash = node.hash();
        let store = InMemoryNodeStore::new();
        store.put_node(hash, &node);
        assert_eq!(store.get_node(&hash).unwrap(), Some(node));
    }

    #[test]
    fn missing_node_is_none_not_an_error() {
        let store = InMemoryNodeStore::new();
        let missing = MerkleTrieNode::Leaf {
            prefix: Nibbles::empty(),
            value: vec![],
        }
        .hash();
        assert_eq!(store.get_node(&missing).unwrap(), None);
    }
}
