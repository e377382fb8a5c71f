//! Keccak-256 hashing and secp256k1 ECDSA signing/recovery.
//!
//! Signing always normalizes to a low-S signature (`s <= n/2`, EIP-2);
//! recovery accepts both low-S and high-S so that signatures produced
//! elsewhere still verify here.

mod batch;
mod error;
mod hash;
mod keys;

pub use batch::verify_batch;
pub use error::CryptoError;
pub use hash::{hash, keccak256, Value as HashValue};
pub use keys::{recover, sign, verify, PublicKey, Signature};
