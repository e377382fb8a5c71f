use crate::node::{MerkleTrieNode, NodeHash};
use std::collections::HashMap;

/// A mapping from node hash to `(node, refcount)`. Positive counts mean
/// net additions, negative counts mean net removals relative to the
/// diff's base root. An abelian monoid under refcount-summing merge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleTrieStateDiff {
    entries: HashMap<[u8; 32], (MerkleTrieNode, i64)>,
}

impl MerkleTrieStateDiff {
    pub fn empty() -> Self {
        MerkleTrieStateDiff {
            entries: HashMap::new(),
        }
    }

    /// Increments the refcount for `node`. If an opposing `-1` was
    /// pending, the entry is removed entirely (net zero).
    pub fn add(&mut self, hash: NodeHash, node: MerkleTrieNode) {
        self.bump(hash, node, 1);
    }

    /// Decrements the refcount for `node`. Symmetric to `add`.
    pub fn remove(&mut self, hash: NodeHash, node: MerkleTrieNode) {
        self.bump(hash, node, -1);
    }

    fn bump(&mut self, hash: NodeHash, node: MerkleTrieNode, delta: i64) {
        let key = hash.to_bytes();
        match self.entries.remove(&key) {
            Some((existing_node, count)) => {
                let new_count = count + delta;
                if new_count != 0 {
                    self.entries.insert(key, (existing_node, new_count));
                }
            }
            None => {
                self.entries.insert(key, (node, delta));
            }
        }
    }

    /// Looks up a node that has a strictly positive net refcount in this
    /// diff; entries at zero or negative count are not "present" here.
    pub fn get(&self, hash: &NodeHash) -> Option<&MerkleTrieNode> {
        self.entries
            .get(&hash.to_bytes())
            .filter(|(_, count)| *count > 0)
            .map(|(node, _)| node)
    }

    pub fn foreach(&self) -> impl Iterator<Item = (&MerkleTrieNode, i64)> {
        self.entries
            .values()
            .filter(|(_, count)| *count > 0)
            .map(|(node, count)| (node, *count))
    }

    /// Refcount-summing merge; the monoid operation. Used by `rebase`
    /// and directly where two diffs over a common base need combining.
    pub fn merge(&self, other: &MerkleTrieStateDiff) -> MerkleTrieStateDiff {
        let mut merged = self.entries.clone();
        for (hash, (node, count)) in &other.entries {
            merged
                .entry(*hash)
                .and_modify(|(_, existing_count)| *existing_count += count)
                .or_insert_with(|| (node.clone(), *count));
        }
        merged.retain(|_, (_, count)| *count != 0);
        MerkleTrieStateDiff { entries: merged }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|(_, count)| *count == 0)
    }
}
