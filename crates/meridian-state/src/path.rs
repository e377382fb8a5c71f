use meridian_codec::ByteEncode;
use meridian_primitives::BigNat;
use std::collections::BTreeSet;

/// An ordered sequence of string segments identifying a mount location,
/// e.g. `["app", "accounts"]`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<String>);

impl Path {
    pub fn new(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Path(segments.into_iter().map(Into::into).collect())
    }

    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn join(&self, segment: impl Into<String>) -> Path {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Path(segments)
    }
}

/// `BigNat(len(utf8(s))) ++ utf8(s) ++ 0x00`.
pub fn encode_segment(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = BigNat::from_usize(bytes.len()).encode();
    out.extend_from_slice(bytes);
    out.push(0x00);
    out
}

/// `BigNat(n) ++ ∏ encodeSegment(pᵢ)`.
pub fn encode_path(path: &Path) -> Vec<u8> {
    let mut out = BigNat::from_usize(path.0.len()).encode();
    for segment in &path.0 {
        out.extend(encode_segment(segment));
    }
    out
}

/// `encodePath(path) ++ encodeSegment(name)` — the byte prefix under
/// which a mounted table's keys live.
pub fn table_prefix(path: &Path, name: &str) -> Vec<u8> {
    let mut out = encode_path(path);
    out.extend(encode_segment(name));
    out
}

/// Runtime enforcement of prefix-freedom: no two distinct `(Path,
/// name)` pairs registered through the same validator may produce a
/// table prefix that is a prefix of another's.
#[derive(Default)]
pub struct PrefixFreePath {
    prefixes: BTreeSet<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("table prefix for ({path:?}, {name:?}) is not prefix-free: conflicts with an existing mount")]
pub struct PrefixCollision {
    pub path: Path,
    pub name: String,
}

impl PrefixFreePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `(path, name)`'s table prefix, failing if it collides
    /// (in either direction) with a previously registered one.
    pub fn register(&mut self, path: &Path, name: &str) -> Result<Vec<u8>, PrefixCollision> {
        let candidate = table_prefix(path, name);
        for existing in &self.prefixes {
            if existing.starts_with(&candidate) || candidate.starts_with(existing.as_slice()) {
                return Err(PrefixCollision {
                    path: path.clone(),
                    name: name.to_string(),
                });
            }
        }
        self.prefixes.insert(candidate.clone());
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differing_segment_counts_are_not_prefixes_of_each_other() {
        let p1 = table_prefix(&Path::new(["app", "accounts"]), "balances");
        let p2 = table_prefix(&Path::new(["app", "accountants"]), "balances");
        assert!(!p1.starts_with(p2.as_slice()));
        assert!(!p2.starts_with(p1.as_slice()));
    }

    #[test]
    fn shorter_path_is_never_a_prefix_of_a_longer_one() {
        let short = table_prefix(&Path::new(["app"]), "x");
        let long = table_prefix(&Path::new(["app", "sub"]), "x");
        assert!(!long.starts_with(short.as_slice()));
    }

    #[test]
    fn registrar_rejects_colliding_mounts() {
        let mut registrar = PrefixFreePath::new();
        registrar.register(&Path::new(["app"]), "accounts").unwrap();
        assert!(registrar.register(&Path::new(["app"]), "accounts").is_err());
        assert!(registrar.register(&Path::new(["app", "x"]), "y").is_ok());
    }
}
