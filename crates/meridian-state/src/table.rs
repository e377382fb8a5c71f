use crate::error::SigilError;
use crate::store::{StoreF, StoreState};
use meridian_codec::{ByteDecode, ByteEncode};
use meridian_trie::{self as trie, NodeStore, TrieConfig};
use std::marker::PhantomData;
use std::sync::Arc;

/// A schema entry: a name, a key type, and a value type, known at
/// compile time. `Tag` is a zero-sized marker type unique to this
/// entry — it is what makes a key branded to table `A` a distinct Rust
/// type from a key branded to table `B`: keys are branded by the
/// table's identity.
pub struct Entry<Tag, K, V> {
    pub name: &'static str,
    _marker: PhantomData<(Tag, K, V)>,
}

impl<Tag, K, V> Entry<Tag, K, V> {
    pub const fn new(name: &'static str) -> Self {
        Entry {
            name,
            _marker: PhantomData,
        }
    }
}

/// A key branded by the identity of the table it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BrandedKey<Tag, K> {
    pub key: K,
    _marker: PhantomData<Tag>,
}

impl<Tag, K> BrandedKey<Tag, K> {
    pub fn new(key: K) -> Self {
        BrandedKey {
            key,
            _marker: PhantomData,
        }
    }
}

/// A runtime handle to a mounted table: its computed byte prefix, its
/// name, and the node store it reads and writes through.
pub struct StateTable<Tag, K, V> {
    prefix: Vec<u8>,
    name: String,
    node_store: Arc<dyn NodeStore>,
    config: TrieConfig,
    _marker: PhantomData<(Tag, K, V)>,
}

impl<Tag, K, V> StateTable<Tag, K, V>
where
    K: ByteEncode + 'static,
    V: ByteEncode + ByteDecode + Clone + 'static,
{
    pub fn new(
        prefix: Vec<u8>,
        name: impl Into<String>,
        node_store: Arc<dyn NodeStore>,
        config: TrieConfig,
    ) -> Self {
        StateTable {
            prefix,
            name: name.into(),
            node_store,
            config,
            _marker: PhantomData,
        }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn full_key(&self, raw_key: &[u8]) -> Vec<u8> {
        let mut out = self.prefix.clone();
        out.extend_from_slice(raw_key);
        out
    }

    /// Looks up `key.key`, recording a read against this table's prefix
    /// in the threaded `StoreState`'s access log.
    pub fn get(&self, key: BrandedKey<Tag, K>) -> StoreF<Option<V>>
    where
        Tag: 'static,
    {
        let raw_key = key.key.encode();
        let full_key = self.full_key(&raw_key);
        let prefix = self.prefix.clone();
        let node_store = self.node_store.clone();
        let config = self.config;

        StoreF::from_fn(move |mut state: StoreState| {
            let value_bytes = trie::get(&state.trie, node_store.as_ref(), &full_key, &config)?;
            state.access_log.record_read(prefix, raw_key);
            let value = match value_bytes {
                None => None,
                Some(bytes) => Some(decode_exact::<V>(&bytes)?),
            };
            Ok((state, value))
        })
    }

    /// Stores `value` under `key.key`, recording a write.
    pub fn put(&self, key: BrandedKey<Tag, K>, value: V) -> StoreF<()>
    where
        Tag: 'static,
    {
        let raw_key = key.key.encode();
        let full_key = self.full_key(&raw_key);
        let prefix = self.prefix.clone();
        let node_store = self.node_store.clone();
        let config = self.config;
        let value_bytes = value.encode();

        StoreF::from_fn(move |mut state: StoreState| {
            state.trie = trie::put(&state.trie, node_store.as_ref(), &full_key, &value_bytes, &config)?;
            state.access_log.record_write(prefix, raw_key);
            Ok((state, ()))
        })
    }

    /// Deletes `key.key`, recording a write (absence is not an error).
    pub fn remove(&self, key: BrandedKey<Tag, K>) -> StoreF<()>
    where
        Tag: 'static,
    {
        let raw_key = key.key.encode();
        let full_key = self.full_key(&raw_key);
        let prefix = self.prefix.clone();
        let node_store = self.node_store.clone();
        let config = self.config;

        StoreF::from_fn(move |mut state: StoreState| {
            state.trie = trie::remove(&state.trie, node_store.as_ref(), &full_key, &config)?;
            state.access_log.record_write(prefix, raw_key);
            Ok((state, ()))
        })
    }
}

fn decode_exact<V: ByteDecode>(bytes: &[u8]) -> Result<V, SigilError> {
    let (value, rest) = V::decode(bytes)?;
    if !rest.is_empty() {
        return Err(SigilError::other(format!(
            "{} trailing byte(s) left over decoding a table value",
            rest.len()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreState;
    use meridian_trie::{InMemoryNodeStore, MerkleTrieState};

    struct AccountsTag;

    #[test]
    fn put_then_get_round_trips_and_logs_access() {
        let concrete_store = Arc::new(InMemoryNodeStore::new());
        let node_store: Arc<dyn NodeStore> = concrete_store.clone();
        let table: StateTable<AccountsTag, Vec<u8>, Vec<u8>> = StateTable::new(
            b"accounts".to_vec(),
            "accounts",
            node_store,
            TrieConfig::default(),
        );

        let state = StoreState {
            trie: MerkleTrieState::genesis(),
            access_log: crate::access_log::AccessLog::empty(),
        };

        let key = BrandedKey::new(b"alice".to_vec());
        let (state, ()) = table.put(key.clone(), b"balance:100".to_vec()).run(state).unwrap();

        // Nodes created by `put` live only in the diff until published;
        // copy them into the store the way a host would after commit.
        for (node, count) in state.trie.diff.foreach() {
            if count > 0 {
                concrete_store.put_node(node.hash(), node);
            }
        }

        let (state, value) = table.get(key).run(state).unwrap();
        assert_eq!(value, Some(b"balance:100".to_vec()));
        assert_eq!(state.access_log.read_count(), 1);
        assert_eq!(state.access_log.write_count(), 1);
    }
}
