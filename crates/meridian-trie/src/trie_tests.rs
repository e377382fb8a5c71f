#[cfg(test)]
mod tests {
    use crate::{get, put, remove, stream_from, InMemoryNodeStore, MerkleTrieState, TrieConfig};

    fn store_and_sync(state: &MerkleTrieState, store: &InMemoryNodeStore) {
        for (node, count) in state.diff.foreach() {
            if count > 0 {
                store.put_node(node.hash(), node);
            }
        }
    }

    #[test]
    fn get_returns_last_put_not_followed_by_remove() {
        let store = InMemoryNodeStore::new();
        let config = TrieConfig::default();
        let mut state = MerkleTrieState::genesis();

        state = put(&state, &store, b"alpha", b"1", &config).unwrap();
        store_and_sync(&state, &store);
        state = put(&state, &store, b"beta", b"2", &config).unwrap();
        store_and_sync(&state, &store);
        state = put(&state, &store, b"alpha", b"3", &config).unwrap();
        store_and_sync(&state, &store);

        assert_eq!(get(&state, &store, b"alpha", &config).unwrap(), Some(b"3".to_vec()));
        assert_eq!(get(&state, &store, b"beta", &config).unwrap(), Some(b"2".to_vec()));
        assert_eq!(get(&state, &store, b"gamma", &config).unwrap(), None);

        state = remove(&state, &store, b"alpha", &config).unwrap();
        store_and_sync(&state, &store);
        assert_eq!(get(&state, &store, b"alpha", &config).unwrap(), None);
        assert_eq!(get(&state, &store, b"beta", &config).unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn remove_of_absent_key_is_a_no_op() {
        let store = InMemoryNodeStore::new();
        let config = TrieConfig::default();
        let mut state = MerkleTrieState::genesis();
        state = put(&state, &store, b"only", b"v", &config).unwrap();
        store_and_sync(&state, &store);

        let unchanged = remove(&state, &store, b"missing", &config).unwrap();
        assert_eq!(unchanged, state);
    }

    #[test]
    fn root_depends_only_on_the_multiset_of_key_value_pairs() {
        let store = InMemoryNodeStore::new();
        let config = TrieConfig::default();

        let mut a = MerkleTrieState::genesis();
        a = put(&a, &store, b"one", b"1", &config).unwrap();
        store_and_sync(&a, &store);
        a = put(&a, &store, b"two", b"2", &config).unwrap();
        store_and_sync(&a, &store);

        let mut b = MerkleTrieState::genesis();
        b = put(&b, &store, b"two", b"2", &config).unwrap();
        store_and_sync(&b, &store);
        b = put(&b, &store, b"one", b"1", &config).unwrap();
        store_and_sync(&b, &store);

        assert_eq!(a.current_root.map(|h| h.to_bytes()), b.current_root.map(|h| h.to_bytes()));
    }

    #[test]
    fn stream_from_orders_entries_and_respects_prefix() {
        let store = InMemoryNodeStore::new();
        let config = TrieConfig::default();
        let mut state = MerkleTrieState::genesis();

        for key in [b"ab".as_slice(), b"ac".as_slice(), b"b".as_slice()] {
            state = put(&state, &store, key, key, &config).unwrap();
            store_and_sync(&state, &store);
        }

        let all = stream_from(&state, &store, b"a", &config).unwrap();
        let keys: Vec<Vec<u8>> = all.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"ab".to_vec(), b"ac".to_vec()]);

        let everything = stream_from(&state, &store, b"", &config).unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn rebase_requires_matching_base_and_sums_refcounts() {
        let store = InMemoryNodeStore::new();
        let config = TrieConfig::default();
        let genesis = MerkleTrieState::genesis();

        let state1 = put(&genesis, &store, b"x", b"1", &config).unwrap();
        let state2 = put(&genesis, &store, b"y", b"2", &config).unwrap();

        let rebased = state1.rebase(&state2).unwrap();
        assert_eq!(rebased.base_root, state2.current_root);

        let mismatched = MerkleTrieState {
            current_root: state1.current_root,
            base_root: state1.current_root,
            diff: state1.diff.clone(),
        };
        assert!(state1.rebase(&mismatched).is_err());
    }

    #[test]
    fn converting_leaf_to_branch_with_data_preserves_both_values() {
        let store = InMemoryNodeStore::new();
        let config = TrieConfig::default();
        let mut state = MerkleTrieState::genesis();

        // "a" and "ab" share a common prefix where one key is a proper
        // prefix of the other.
        state = put(&state, &store, b"a", b"short", &config).unwrap();
        store_and_sync(&state, &store);
        state = put(&state, &store, b"ab", b"long", &config).unwrap();
        store_and_sync(&state, &store);

        assert_eq!(get(&state, &store, b"a", &config).unwrap(), Some(b"short".to_vec()));
        assert_eq!(get(&state, &store, b"ab", &config).unwrap(), Some(b"long".to_vec()));
    }
}
