//! Performance benchmarks for the hot paths a host embedding this crate
//! would actually drive at load: trie insertion/lookup, ordered-key
//! byte encoding, and ECDSA recovery.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meridian_codec::ByteEncode;
use meridian_crypto::{keccak256, recover, sign};
use meridian_primitives::{UInt256, Utf8Key};
use meridian_trie::{get, put, InMemoryNodeStore, MerkleTrieState, TrieConfig};
use std::time::Duration;

fn bench_trie_put_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle-trie");
    group.measurement_time(Duration::from_secs(5));

    let sizes = [10usize, 100, 1_000];
    for size in sizes {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("put_sequential", size), &size, |b, &size| {
            b.iter(|| {
                let store = InMemoryNodeStore::new();
                let config = TrieConfig::default();
                let mut state = MerkleTrieState::genesis();
                for i in 0..size {
                    let key = format!("key-{i}");
                    state = put(&state, &store, key.as_bytes(), b"value", &config).unwrap();
                }
                black_box(state)
            })
        });

        let store = InMemoryNodeStore::new();
        let config = TrieConfig::default();
        let mut state = MerkleTrieState::genesis();
        for i in 0..size {
            let key = format!("key-{i}");
            state = put(&state, &store, key.as_bytes(), b"value", &config).unwrap();
        }
        group.bench_with_input(BenchmarkId::new("get_hit", size), &size, |b, _| {
            b.iter(|| black_box(get(&state, &store, b"key-0", &config).unwrap()))
        });
    }
}

fn bench_ordered_key_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let key = Utf8Key::new("an-account-name-of-typical-length");
    group.bench_function("utf8_key_encode", |b| b.iter(|| black_box(key.encode())));
}

fn bench_ecdsa_recover(c: &mut Criterion) {
    let mut group = c.benchmark_group("crypto");
    let privkey = UInt256::from_u64(7);
    let digest = keccak256(b"benchmark transaction payload");
    let signature = sign(&privkey, &digest).unwrap();

    group.bench_function("recover_signer", |b| {
        b.iter(|| black_box(recover(&signature, &digest).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_trie_put_get,
    bench_ordered_key_encoding,
    bench_ecdsa_recover
);
criterion_main!(benches);
