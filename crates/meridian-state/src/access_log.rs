use std::collections::{BTreeMap, BTreeSet};

/// The reads and writes a single unit of execution (typically one
/// transaction) performed, keyed by table prefix and then by the exact
/// key bytes within that table. Used to detect whether two units of
/// execution may run in parallel without observing each other's
/// effects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessLog {
    reads: BTreeMap<Vec<u8>, BTreeSet<Vec<u8>>>,
    writes: BTreeMap<Vec<u8>, BTreeSet<Vec<u8>>>,
}

/// The way two access logs conflicted. Nonce conflicts have no
/// analogue at this layer — nonce checks are a module's reducer
/// concern, not the table-level access log's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    ReadWrite,
    WriteWrite,
}

/// One conflicting `(prefix, key)` between two access logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub table_prefix: Vec<u8>,
    pub key: Vec<u8>,
}

impl AccessLog {
    pub fn empty() -> Self {
        AccessLog::default()
    }

    pub fn record_read(&mut self, table_prefix: Vec<u8>, key: Vec<u8>) {
        self.reads.entry(table_prefix).or_default().insert(key);
    }

    pub fn record_write(&mut self, table_prefix: Vec<u8>, key: Vec<u8>) {
        self.writes.entry(table_prefix).or_default().insert(key);
    }

    pub fn read_count(&self) -> usize {
        self.reads.values().map(BTreeSet::len).sum()
    }

    pub fn write_count(&self) -> usize {
        self.writes.values().map(BTreeSet::len).sum()
    }

    /// Union of reads and writes from both logs. Commutative and
    /// associative, so independently-collected logs can be combined in
    /// any order or grouping.
    pub fn merge(&self, other: &AccessLog) -> AccessLog {
        let mut merged = self.clone();
        for (prefix, keys) in &other.reads {
            merged.reads.entry(prefix.clone()).or_default().extend(keys.iter().cloned());
        }
        for (prefix, keys) in &other.writes {
            merged.writes.entry(prefix.clone()).or_default().extend(keys.iter().cloned());
        }
        merged
    }

    /// `(R1 ∩ W2) ∪ (W1 ∩ R2) ∪ (W1 ∩ W2) != ∅`, evaluated per
    /// `(table_prefix, key)`.
    pub fn conflicts_with(&self, other: &AccessLog) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        conflicts.extend(overlap(&self.writes, &other.writes, ConflictKind::WriteWrite));
        conflicts.extend(overlap(&self.reads, &other.writes, ConflictKind::ReadWrite));
        conflicts.extend(overlap(&self.writes, &other.reads, ConflictKind::ReadWrite));
        conflicts
    }

    pub fn has_conflict_with(&self, other: &AccessLog) -> bool {
        !self.conflicts_with(other).is_empty()
    }
}

fn overlap(
    a: &BTreeMap<Vec<u8>, BTreeSet<Vec<u8>>>,
    b: &BTreeMap<Vec<u8>, BTreeSet<Vec<u8>>>,
    kind: ConflictKind,
) -> Vec<Conflict> {
    let mut out = Vec::new();
    for (prefix, a_keys) in a {
        let Some(b_keys) = b.get(prefix) else {
            continue;
        };
        for key in a_keys.intersection(b_keys) {
            out.push(Conflict {
                kind,
                table_prefix: prefix.clone(),
                key: key.clone(),
            });
        }
    }
    out
}

/// Pairwise conflict detection across a batch of access logs, the basis
/// for deciding which transactions in a block may execute in parallel.
/// Run in parallel with `rayon` since the pair count is quadratic in
/// block size.
pub fn detect_conflicts(logs: &[AccessLog]) -> Vec<(usize, usize, Conflict)> {
    use rayon::prelude::*;

    let pairs: Vec<(usize, usize)> = (0..logs.len())
        .flat_map(|i| ((i + 1)..logs.len()).map(move |j| (i, j)))
        .collect();

    pairs
        .par_iter()
        .flat_map_iter(|&(i, j)| {
            logs[i]
                .conflicts_with(&logs[j])
                .into_iter()
                .map(move |c| (i, j, c))
        })
        .collect()
}
