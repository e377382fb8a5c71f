//! Cross-crate integration tests.
//!
//! Unlike each crate's own `#[cfg(test)]` modules, the tests here exercise
//! more than one crate at once: codec vectors against `meridian-crypto`,
//! the trie against the state layer, and the account/group modules
//! mounted together through `meridian-modules`.

#![allow(unused_imports)]

pub mod integration;
