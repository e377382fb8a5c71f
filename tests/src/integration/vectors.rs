//! Fixed-vector checks for the primitives every other crate builds on:
//! Keccak-256 digests, key recovery, and mount-path prefix encoding.

use meridian_crypto::{keccak256, recover, sign};
use meridian_primitives::UInt256;
use meridian_state::{encode_path, encode_segment, Path};

#[test]
fn keccak256_matches_known_vectors() {
    let empty = keccak256(&[]);
    assert_eq!(
        hex::encode(empty),
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );

    let fox = keccak256(b"The quick brown fox jumps over the lazy dog");
    assert_eq!(
        hex::encode(fox),
        "4d741b6f1eb29cb2a9b9911c82f56fa8d73b04959d3d9d222895df6c0b28aa15"
    );
}

#[test]
fn recovering_from_a_known_private_key_yields_the_known_public_key() {
    let privkey =
        UInt256::from_hex("10e93a6c964aa6bc089f84e4fe3fb37583f3e1162891a689dd99bb629520f3df").unwrap();
    let digest = keccak256(b"some-data");
    let signature = sign(&privkey, &digest).unwrap();
    let recovered = recover(&signature, &digest).unwrap();

    let expected = hex::decode(
        "e72699136b12ffd11549616ff047cd5ec93665cd6f13b859030a3c99d14842abc27a7442bc05143db53c41407a7059c85def28f6749b86b3123c48be3085e459",
    )
    .unwrap();
    assert_eq!(recovered.to_xy_bytes().to_vec(), expected);
}

#[test]
fn mount_path_prefixes_are_free_across_differing_segment_counts() {
    let a = {
        let mut out = encode_path(&Path::new(["app", "accounts"]));
        out.extend(encode_segment("balances"));
        out
    };
    let b = {
        let mut out = encode_path(&Path::new(["app", "accountants"]));
        out.extend(encode_segment("balances"));
        out
    };
    assert!(!a.starts_with(&b) && !b.starts_with(&a));

    let c = {
        let mut out = encode_path(&Path::new(["app", "accounts", "extra"]));
        out.extend(encode_segment("balances"));
        out
    };
    assert!(!a.starts_with(&c) && !c.starts_with(&a));
}
