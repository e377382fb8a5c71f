//! Round-trips the Merkle trie's `put`/`get`/`remove` through an
//! in-memory node store, and checks `AccessLog` conflict detection
//! against the reads/writes such a put/get sequence would record.

use meridian_state::AccessLog;
use meridian_trie::{get, put, remove, InMemoryNodeStore, MerkleTrieState, TrieConfig};

#[test]
fn put_get_remove_round_trips_independent_keys() {
    let store = InMemoryNodeStore::new();
    let config = TrieConfig::default();
    let state = MerkleTrieState::genesis();

    let state = put(&state, &store, b"k1", b"v1", &config).unwrap();
    let state = put(&state, &store, b"k2", b"v2", &config).unwrap();

    assert_eq!(get(&state, &store, b"k1", &config).unwrap(), Some(b"v1".to_vec()));
    assert_eq!(get(&state, &store, b"k2", &config).unwrap(), Some(b"v2".to_vec()));

    let state = remove(&state, &store, b"k1", &config).unwrap();
    assert_eq!(get(&state, &store, b"k1", &config).unwrap(), None);
    assert_eq!(get(&state, &store, b"k2", &config).unwrap(), Some(b"v2".to_vec()));
}

#[test]
fn overlapping_writes_conflict_but_overlapping_reads_do_not() {
    let mut a = AccessLog::empty();
    a.record_write(b"table".to_vec(), b"k1".to_vec());

    let mut b = AccessLog::empty();
    b.record_write(b"table".to_vec(), b"k1".to_vec());
    assert!(a.has_conflict_with(&b));

    let mut c = AccessLog::empty();
    c.record_read(b"table".to_vec(), b"k1".to_vec());
    let mut d = AccessLog::empty();
    d.record_read(b"table".to_vec(), b"k1".to_vec());
    assert!(!c.has_conflict_with(&d));
}
