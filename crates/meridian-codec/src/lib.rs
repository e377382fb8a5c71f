//! Deterministic byte/JSON codec layer.
//!
//! Every type the library hands to a hash, a signature, or a trie key goes
//! through `ByteEncode`/`ByteDecode` here so that two nodes on two
//! platforms compute bit-identical encodings. A subset of codecs
//! additionally implement `OrderedCodec`, which lets their natural
//! ordering be recovered from a byte-lexicographic comparison of their
//! encodings.

mod byte_codec;
mod error;
mod json;

pub use byte_codec::{ByteDecode, ByteEncode, ByteVector, Instant, OrderedCodec};
pub use error::DecodeError;
pub use json::{JsonCodec, JsonValue};
