use meridian_codec::{ByteDecode, ByteEncode, DecodeError};
use meridian_crypto::{keccak256, HashValue};
use meridian_primitives::{BigNat, Nibbles};

/// Identity of a node: `keccak256(encode(node))`, branded so it cannot be
/// confused with a hash of some other domain object.
pub type NodeHash = HashValue<MerkleTrieNode>;

const TAG_LEAF: u8 = 0x01;
const TAG_BRANCH: u8 = 0x02;
const TAG_BRANCH_WITH_DATA: u8 = 0x03;

/// A node of the radix-16 Merkle patricia trie.
///
/// `prefix` is the shared nibble suffix along the edge leading into this
/// node — the standard patricia-trie compression of single-child chains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MerkleTrieNode {
    Leaf {
        prefix: Nibbles,
        value: Vec<u8>,
    },
    Branch {
        prefix: Nibbles,
        children: [Option<NodeHash>; 16],
    },
    BranchWithData {
        prefix: Nibbles,
        children: [Option<NodeHash>; 16],
        value: Vec<u8>,
    },
}

impl MerkleTrieNode {
    pub fn prefix(&self) -> &Nibbles {
        match self {
            MerkleTrieNode::Leaf { prefix, .. } => prefix,
            MerkleTrieNode::Branch { prefix, .. } => prefix,
            MerkleTrieNode::BranchWithData { prefix, .. } => prefix,
        }
    }

    pub fn value(&self) -> Option<&[u8]> {
        match self {
            MerkleTrieNode::Leaf { value, .. } => Some(value),
            MerkleTrieNode::Branch { .. } => None,
            MerkleTrieNode::BranchWithData { value, .. } => Some(value),
        }
    }

    pub fn children(&self) -> Option<&[Option<NodeHash>; 16]> {
        match self {
            MerkleTrieNode::Leaf { .. } => None,
            MerkleTrieNode::Branch { children, .. } => Some(children),
            MerkleTrieNode::BranchWithData { children, .. } => Some(children),
        }
    }

    pub fn hash(&self) -> NodeHash {
        HashValue::from_bytes(keccak256(&self.encode()))
    }
}

fn encode_children(children: &[Option<NodeHash>; 16]) -> Vec<u8> {
    let mut bitmap: u16 = 0;
    for (i, child) in children.iter().enumerate() {
        if child.is_some() {
            bitmap |= 1 << i;
        }
    }
    let mut out = bitmap.to_be_bytes().to_vec();
    for child in children.iter().flatten() {
        out.extend_from_slice(child.as_bytes());
    }
    out
}

fn decode_children(bytes: &[u8]) -> Result<([Option<NodeHash>; 16], &[u8]), DecodeError> {
    if bytes.len() < 2 {
        return Err(DecodeError::unexpected_end("MerkleTrieNode.existence_bits"));
    }
    let (bitmap_bytes, mut rest) = bytes.split_at(2);
    let bitmap = u16::from_be_bytes([bitmap_bytes[0], bitmap_bytes[1]]);
    let mut children: [Option<NodeHash>; 16] = Default::default();
    for (i, slot) in children.iter_mut().enumerate() {
        if bitmap & (1 << i) != 0 {
            if rest.len() < 32 {
                return Err(DecodeError::unexpected_end("MerkleTrieNode.child_hash"));
            }
            let (hash_bytes, remainder) = rest.split_at(32);
            let mut buf = [0u8; 32];
            buf.copy_from_slice(hash_bytes);
            *slot = Some(NodeHash::from_bytes(buf));
            rest = remainder;
        }
    }
    Ok((children, rest))
}

impl ByteEncode for MerkleTrieNode {
    fn encode(&self) -> Vec<u8> {
        match self {
            MerkleTrieNode::Leaf { prefix, value } => {
                let mut out = vec![TAG_LEAF];
                out.extend(prefix.encode());
                out.extend(BigNat::from_usize(value.len()).encode());
                out.extend_from_slice(value);
                out
            }
            MerkleTrieNode::Branch { prefix, children } => {
                let mut out = vec![TAG_BRANCH];
                out.extend(prefix.encode());
                out.extend(encode_children(children));
                out
            }
            MerkleTrieNode::BranchWithData {
                prefix,
                children,
                value,
            } => {
                let mut out = vec![TAG_BRANCH_WITH_DATA];
                out.extend(prefix.encode());
                out.extend(encode_children(children));
                out.extend(BigNat::from_usize(value.len()).encode());
                out.extend_from_slice(value);
                out
            }
        }
    }
}

impl ByteDecode for MerkleTrieNode {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (tag, rest) = bytes
            .split_first()
            .ok_or_else(|| DecodeError::unexpected_end("MerkleTrieNode.tag"))?;
        let (prefix, rest) = Nibbles::decode(rest)?;
        match *tag {
            TAG_LEAF => {
                let (len, rest) = BigNat::decode(rest)?;
                let len = len
                    .to_usize()
                    .ok_or_else(|| DecodeError::new("MerkleTrieNode value length too large"))?;
                if rest.len() < len {
                    return Err(DecodeError::unexpected_end("MerkleTrieNode.Leaf.value"));
                }
                let (value, rest) = rest.split_at(len);
                Ok((
                    MerkleTrieNode::Leaf {
                        prefix,
                        value: value.to_vec(),
                    },
                    rest,
                ))
            }
            TAG_BRANCH => {
                let (children, rest) = decode_children(rest)?;
                Ok((MerkleTrieNode::Branch { prefix, children }, rest))
            }
            TAG_BRANCH_WITH_DATA => {
                let (children, rest) = decode_children(rest)?;
                let (len, rest) = BigNat::decode(rest)?;
                let len = len
                    .to_usize()
                    .ok_or_else(|| DecodeError::new("MerkleTrieNode value length too large"))?;
                if rest.len() < len {
                    return Err(DecodeError::unexpected_end(
                        "MerkleTrieNode.BranchWithData.value",
                    ));
                }
                let (value, rest) = rest.split_at(len);
                Ok((
                    MerkleTrieNode::BranchWithData {
                        prefix,
                        children,
                        value: value.to_vec(),
                    },
                    rest,
                ))
            }
            other => Err(DecodeError::new(format!(
                "unknown MerkleTrieNode tag {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_roundtrips() {
        let node = MerkleTrieNode::Leaf {
            prefix: Nibbles::from_nibbles(vec![1, 2, 3]),
            value: b"hello".to_vec(),
        };
        let bytes = node.encode();
        let (decoded, rest) = MerkleTrieNode::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, node);
    }

    #[test]
    fn branch_roundtrips_with_sparse_children() {
        let mut children: [Option<NodeHash>; 16] = Default::default();
        children[0] = Some(NodeHash::from_bytes([0xAA; 32]));
        children[15] = Some(NodeHash::from_bytes([0xBB; 32]));
        let node = MerkleTrieNode::Branch {
            prefix: Nibbles::empty(),
            children,
        };
        let bytes = node.encode();
        let (decoded, rest) = MerkleTrieNode::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, node);
    }

    #[test]
    fn branch_with_data_roundtrips() {
        let mut children: [Option<NodeHash>; 16] = Default::default();
        children[3] = Some(NodeHash::from_bytes([0x01; 32]));
        let node = MerkleTrieNode::BranchWithData {
            prefix: Nibbles::from_nibbles(vec![4]),
            children,
            value: b"value".to_vec(),
        };
        let bytes = node.encode();
        let (decoded, rest) = MerkleTrieNode::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, node);
    }

    #[test]
    fn distinct_nodes_hash_differently() {
        let a = MerkleTrieNode::Leaf {
            prefix: Nibbles::empty(),
            value: b"a".to_vec(),
        };
        let b = MerkleTrieNode::Leaf {
            prefix: Nibbles::empty(),
            value: b"b".to_vec(),
        };
        assert_ne!(a.hash().to_bytes(), b.hash().to_bytes());
    }
}
