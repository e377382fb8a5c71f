//! Fixed-width and length-prefixed primitive types built on top of the
//! byte/JSON codec layer: arbitrary-precision integers, order-preserving
//! strings, trie nibble sequences, and the fixed 256-bit word used for
//! account balances and similar quantities.

mod bigint;
mod bignat;
mod nibbles;
mod uint256;
mod utf8;
mod utf8_key;

pub use bigint::BigIntValue;
pub use bignat::{BigNat, BigNatUnderflow};
pub use nibbles::Nibbles;
pub use uint256::{UInt256, UInt256Failure};
pub use utf8::Utf8;
pub use utf8_key::Utf8Key;
