use crate::diff::MerkleTrieStateDiff;
use crate::error::TrieError;
use crate::node::{MerkleTrieNode, NodeHash};
use crate::store::NodeStore;
use meridian_primitives::Nibbles;

/// Bounds nibble-path depth as a DoS guard.
#[derive(Clone, Copy, Debug)]
pub struct TrieConfig {
    pub max_depth: usize,
}

impl Default for TrieConfig {
    fn default() -> Self {
        TrieConfig { max_depth: 256 }
    }
}

/// The current and base roots of a trie, plus the pending diff between
/// them. A persistent data structure: every operation returns a new
/// `MerkleTrieState` rather than mutating an existing one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleTrieState {
    pub current_root: Option<NodeHash>,
    pub base_root: Option<NodeHash>,
    pub diff: MerkleTrieStateDiff,
}

impl MerkleTrieState {
    pub fn genesis() -> Self {
        MerkleTrieState {
            current_root: None,
            base_root: None,
            diff: MerkleTrieStateDiff::empty(),
        }
    }

    /// Valid only when the two states share a base root. The result's
    /// base advances to `other`'s current root; the diffs are combined
    /// by refcount summation. `self`'s own content root is untouched —
    /// rebasing updates bookkeeping about what the diff is relative to,
    /// not the trie's actual content.
    pub fn rebase(&self, other: &MerkleTrieState) -> Result<MerkleTrieState, TrieError> {
        if self.base_root != other.base_root {
            return Err(TrieError::DifferentBase);
        }
        Ok(MerkleTrieState {
            current_root: self.current_root,
            base_root: other.current_root,
            diff: self.diff.merge(&other.diff),
        })
    }
}

fn fetch(
    store: &dyn NodeStore,
    diff: &MerkleTrieStateDiff,
    hash: &NodeHash,
) -> Result<MerkleTrieNode, TrieError> {
    if let Some(node) = diff.get(hash) {
        return Ok(node.clone());
    }
    store
        .get_node(hash)?
        .ok_or_else(|| TrieError::MissingNode {
            hash: format!("{hash:?}"),
        })
}

fn check_depth(depth: usize, config: &TrieConfig) -> Result<(), TrieError> {
    if depth > config.max_depth {
        return Err(TrieError::DepthExceeded {
            depth,
            max_depth: config.max_depth,
        });
    }
    Ok(())
}

/// Traverses from `current_root`, matching each node's prefix against
/// the remaining key nibbles, until the key is exhausted or a mismatch
/// is found. A missing node along the path is a hard failure (malformed
/// trie), never treated as key absence.
pub fn get(
    state: &MerkleTrieState,
    store: &dyn NodeStore,
    key: &[u8],
    config: &TrieConfig,
) -> Result<Option<Vec<u8>>, TrieError> {
    let Some(root) = state.current_root else {
        return Ok(None);
    };
    get_rec(store, &state.diff, root, &Nibbles::from_bytes(key), 0, config)
}

fn get_rec(
    store: &dyn NodeStore,
    diff: &MerkleTrieStateDiff,
    hash: NodeHash,
    remaining: &Nibbles,
    depth: usize,
    config: &TrieConfig,
) -> Result<Option<Vec<u8>>, TrieError> {
    check_depth(depth, config)?;
    let node = fetch(store, diff, &hash)?;
    let Some(rest) = remaining.strip_prefix(node.prefix()) else {
        return Ok(None);
    };
    match &node {
        MerkleTrieNode::Leaf { value, .. } => {
            if rest.is_empty() {
                Ok(Some(value.clone()))
            } else {
                Ok(None)
            }
        }
        MerkleTrieNode::Branch { children, .. } => {
            if rest.is_empty() {
                return Ok(None);
            }
            match children[rest.head().unwrap() as usize] {
                None => Ok(None),
                Some(child) => get_rec(store, diff, child, &rest.tail(), depth + 1, config),
            }
        }
        MerkleTrieNode::BranchWithData {
            children, value, ..
        } => {
            if rest.is_empty() {
                return Ok(Some(value.clone()));
            }
            match children[rest.head().unwrap() as usize] {
                None => Ok(None),
                Some(child) => get_rec(store, diff, child, &rest.tail(), depth + 1, config),
            }
        }
    }
}

/// Inserts or replaces `value` at `key`. Every altered or newly created
/// node is added to the returned state's diff with `+1`; every
/// superseded node is added with `-1`.
pub fn put(
    state: &MerkleTrieState,
    store: &dyn NodeStore,
    key: &[u8],
    value: &[u8],
    config: &TrieConfig,
) -> Result<MerkleTrieState, TrieError> {
    let mut diff = state.diff.clone();
    let new_root = put_rec(
        store,
        &mut diff,
        state.current_root,
        &Nibbles::from_bytes(key),
        value,
        0,
        config,
    )?;
    Ok(MerkleTrieState {
        current_root: Some(new_root),
        base_root: state.base_root,
        diff,
    })
}

fn insert_and_hash(diff: &mut MerkleTrieStateDiff, node: MerkleTrieNode) -> NodeHash {
    let hash = node.hash();
    diff.add(hash, node);
    hash
}

fn put_rec(
    store: &dyn NodeStore,
    diff: &mut MerkleTrieStateDiff,
    node_hash: Option<NodeHash>,
    key: &Nibbles,
    value: &[u8],
    depth: usize,
    config: &TrieConfig,
) -> Result<NodeHash, TrieError> {
    check_depth(depth, config)?;

    let Some(old_hash) = node_hash else {
        // Case (i): empty trie at this position — create a leaf.
        return Ok(insert_and_hash(
            diff,
            MerkleTrieNode::Leaf {
                prefix: key.clone(),
                value: value.to_vec(),
            },
        ));
    };

    let old_node = fetch(store, diff, &old_hash)?;
    let prefix = old_node.prefix().clone();
    let common = key.common_prefix_len(&prefix);

    if common == prefix.len() && common == key.len() {
        // Case (ii): exact match — replace the value, converting a bare
        // Branch into a BranchWithData if needed.
        let new_node = match &old_node {
            MerkleTrieNode::Leaf { .. } => MerkleTrieNode::Leaf {
                prefix,
                value: value.to_vec(),
            },
            MerkleTrieNode::Branch { children, .. } => MerkleTrieNode::BranchWithData {
                prefix,
                children: *children,
                value: value.to_vec(),
            },
            MerkleTrieNode::BranchWithData { children, .. } => MerkleTrieNode::BranchWithData {
                prefix,
                children: *children,
                value: value.to_vec(),
            },
        };
        diff.remove(old_hash, old_node);
        return Ok(insert_and_hash(diff, new_node));
    }

    if common == prefix.len() {
        // The node's prefix is a proper prefix of the key: descend
        // through (or past) this node's children.
        let rest = key.strip_prefix(&prefix).expect("common == prefix.len()");
        let head = rest.head().expect("common < key.len()") as usize;
        let tail = rest.tail();

        let (mut children, own_value) = match &old_node {
            MerkleTrieNode::Leaf { value, .. } => (<[Option<NodeHash>; 16]>::default(), Some(value.clone())),
            MerkleTrieNode::Branch { children, .. } => (*children, None),
            MerkleTrieNode::BranchWithData { children, value, .. } => {
                (*children, Some(value.clone()))
            }
        };

        let new_child = put_rec(store, diff, children[head], &tail, value, depth + 1, config)?;
        children[head] = Some(new_child);

        let new_node = match own_value {
            Some(v) => MerkleTrieNode::BranchWithData {
                prefix,
                children,
                value: v,
            },
            None => MerkleTrieNode::Branch { prefix, children },
        };
        diff.remove(old_hash, old_node);
        return Ok(insert_and_hash(diff, new_node));
    }

    // Case (iii)/(iv): the paths share only a proper common prefix (or
    // the key is a proper prefix of the node). Split the edge: push the
    // existing node down as a child of a new branch at the split point.
    let (shared, old_suffix) = prefix.split_at(common);
    let old_head = old_suffix.head().expect("common < prefix.len()") as usize;
    let old_child_prefix = old_suffix.tail();

    let replaced_node = reprefixed(&old_node, old_child_prefix);
    diff.remove(old_hash, old_node);
    let replaced_hash = insert_and_hash(diff, replaced_node);

    let mut new_children: [Option<NodeHash>; 16] = Default::default();
    new_children[old_head] = Some(replaced_hash);

    let key_suffix = key.strip_prefix(&shared).expect("shared is key's prefix");
    let new_node = if key_suffix.is_empty() {
        MerkleTrieNode::BranchWithData {
            prefix: shared,
            children: new_children,
            value: value.to_vec(),
        }
    } else {
        let key_head = key_suffix.head().unwrap() as usize;
        let key_child_prefix = key_suffix.tail();
        let new_leaf = MerkleTrieNode::Leaf {
            prefix: key_child_prefix,
            value: value.to_vec(),
        };
        new_children[key_head] = Some(insert_and_hash(diff, new_leaf));
        MerkleTrieNode::Branch {
            prefix: shared,
            children: new_children,
        }
    };
    Ok(insert_and_hash(diff, new_node))
}

fn reprefixed(node: &MerkleTrieNode, new_prefix: Nibbles) -> MerkleTrieNode {
    match node {
        MerkleTrieNode::Leaf { value, .. } => MerkleTrieNode::Leaf {
            prefix: new_prefix,
            value: value.clone(),
        },
        MerkleTrieNode::Branch { children, .. } => MerkleTrieNode::Branch {
            prefix: new_prefix,
            children: *children,
        },
        MerkleTrieNode::BranchWithData { children, value, .. } => MerkleTrieNode::BranchWithData {
            prefix: new_prefix,
            children: *children,
            value: value.clone(),
        },
    }
}

/// Deletes the entry at `key`. Returns the state unchanged if the key
/// is absent.
pub fn remove(
    state: &MerkleTrieState,
    store: &dyn NodeStore,
    key: &[u8],
    config: &TrieConfig,
) -> Result<MerkleTrieState, TrieError> {
    if get(state, store, key, config)?.is_none() {
        return Ok(state.clone());
    }
    let mut diff = state.diff.clone();
    let root = state.current_root.expect("get found a value, so a root exists");
    let new_root = remove_rec(store, &mut diff, root, &Nibbles::from_bytes(key), 0, config)?;
    Ok(MerkleTrieState {
        current_root: new_root,
        base_root: state.base_root,
        diff,
    })
}

fn remove_rec(
    store: &dyn NodeStore,
    diff: &mut MerkleTrieStateDiff,
    hash: NodeHash,
    remaining: &Nibbles,
    depth: usize,
    config: &TrieConfig,
) -> Result<Option<NodeHash>, TrieError> {
    check_depth(depth, config)?;
    let node = fetch(store, diff, &hash)?;
    let rest = remaining
        .strip_prefix(node.prefix())
        .expect("presence already verified by a preceding get()");

    match &node {
        MerkleTrieNode::Leaf { .. } => {
            diff.remove(hash, node);
            Ok(None)
        }
        MerkleTrieNode::Branch { children, .. } => {
            let head = rest.head().expect("Branch alone carries no value") as usize;
            let child_hash = children[head].expect("presence verified by get()");
            let new_child = remove_rec(store, diff, child_hash, &rest.tail(), depth + 1, config)?;
            let mut new_children = *children;
            new_children[head] = new_child;
            let prefix = node.prefix().clone();
            diff.remove(hash, node);
            finalize_branch(store, diff, prefix, new_children, None)
        }
        MerkleTrieNode::BranchWithData {
            children, value, ..
        } => {
            let prefix = node.prefix().clone();
            if rest.is_empty() {
                let children = *children;
                diff.remove(hash, node);
                finalize_branch(store, diff, prefix, children, None)
            } else {
                let head = rest.head().unwrap() as usize;
                let child_hash = children[head].expect("presence verified by get()");
                let new_child =
                    remove_rec(store, diff, child_hash, &rest.tail(), depth + 1, config)?;
                let mut new_children = *children;
                new_children[head] = new_child;
                let own_value = value.clone();
                diff.remove(hash, node);
                finalize_branch(store, diff, prefix, new_children, Some(own_value))
            }
        }
    }
}

/// Rebuilds a branch-shaped node after one of its children (or its own
/// value) was removed, applying the collapse rules: no children and no
/// value vanishes entirely; no children but a value becomes a Leaf; one
/// remaining child and no value merges into that child with a combined
/// prefix; anything else stays a Branch/BranchWithData.
fn finalize_branch(
    store: &dyn NodeStore,
    diff: &mut MerkleTrieStateDiff,
    prefix: Nibbles,
    children: [Option<NodeHash>; 16],
    own_value: Option<Vec<u8>>,
) -> Result<Option<NodeHash>, TrieError> {
    let present: Vec<(usize, NodeHash)> = children
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.map(|h| (i, h)))
        .collect();

    if present.is_empty() {
        return match own_value {
            None => Ok(None),
            Some(value) => Ok(Some(insert_and_hash(
                diff,
                MerkleTrieNode::Leaf { prefix, value },
            ))),
        };
    }

    if present.len() == 1 && own_value.is_none() {
        let (idx, child_hash) = present[0];
        let child_node = fetch(store, diff, &child_hash)?;
        let merged_prefix = prefix
            .concat(&Nibbles::from_nibbles(vec![idx as u8]))
            .concat(child_node.prefix());
        diff.remove(child_hash, child_node.clone());
        let merged_node = reprefixed(&child_node, merged_prefix);
        return Ok(Some(insert_and_hash(diff, merged_node)));
    }

    let new_node = match own_value {
        Some(value) => MerkleTrieNode::BranchWithData {
            prefix,
            children,
            value,
        },
        None => MerkleTrieNode::Branch { prefix, children },
    };
    Ok(Some(insert_and_hash(diff, new_node)))
}

/// All entries whose key starts with `prefix`, ordered by the
/// nibble-lexicographic order of keys. Eager (not a true lazy
/// generator): the whole matching subtree is collected up front.
pub fn stream_from(
    state: &MerkleTrieState,
    store: &dyn NodeStore,
    prefix: &[u8],
    config: &TrieConfig,
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, TrieError> {
    let Some(root) = state.current_root else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    stream_rec(store, &state.diff, root, &Nibbles::empty(), &mut out, 0, config)?;

    let prefix_nibbles = Nibbles::from_bytes(prefix);
    Ok(out
        .into_iter()
        .filter(|(key, _)| key.as_slice().starts_with(prefix_nibbles.as_slice()))
        .map(|(key, value)| (nibbles_to_bytes(&key), value))
        .collect())
}

fn stream_rec(
    store: &dyn NodeStore,
    diff: &MerkleTrieStateDiff,
    hash: NodeHash,
    accumulated: &Nibbles,
    out: &mut Vec<(Nibbles, Vec<u8>)>,
    depth: usize,
    config: &TrieConfig,
) -> Result<(), TrieError> {
    check_depth(depth, config)?;
    let node = fetch(store, diff, &hash)?;
    let full_path = accumulated.concat(node.prefix());

    match &node {
        MerkleTrieNode::Leaf { value, .. } => {
            out.push((full_path, value.clone()));
        }
        MerkleTrieNode::Branch { children, .. } => {
            for (i, child) in children.iter().enumerate() {
                if let Some(child_hash) = child {
                    let child_path = full_path.concat(&Nibbles::from_nibbles(vec![i as u8]));
                    stream_rec(store, diff, *child_hash, &child_path, out, depth + 1, config)?;
                }
            }
        }
        MerkleTrieNode::BranchWithData {
            children, value, ..
        } => {
            out.push((full_path.clone(), value.clone()));
            for (i, child) in children.iter().enumerate() {
                if let Some(child_hash) = child {
                    let child_path = full_path.concat(&Nibbles::from_nibbles(vec![i as u8]));
                    stream_rec(store, diff, *child_hash, &child_path, out, depth + 1, config)?;
                }
            }
        }
    }
    Ok(())
}

fn nibbles_to_bytes(nibbles: &Nibbles) -> Vec<u8> {
    let slice = nibbles.as_slice();
    debug_assert!(slice.len() % 2 == 0, "keys are always whole byte strings");
    slice
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}
