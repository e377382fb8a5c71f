use crate::error::ModuleError;
use meridian_codec::{ByteDecode, ByteEncode};
use meridian_state::StateTable;
use meridian_trie::{NodeStore, TrieConfig};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A schema entry known at construction time: a name and the recipe for
/// turning a computed prefix into a concrete `StateTable`. `Tag`, `K`
/// and `V` are fixed at the call site (`EntrySpec::new::<Tag, K,
/// V>(name)`); only the prefix and backing store are runtime values.
///
/// This is the Rust stand-in for the `Entry[Name, K, V]` compile-time
/// value: since a blueprint's `Owns`/`Needs` tuples mix entries of
/// different `K`/`V` types, the tuple itself has to be erased to a
/// homogeneous collection. Erase here, at construction, rather than
/// letting `Any` leak into every table access — `StateTable::get/put`
/// stay fully typed once an entry has been instantiated and downcast
/// once by `TablesProvider::table`.
#[derive(Clone)]
pub struct EntrySpec {
    pub name: &'static str,
    make_table: Arc<dyn Fn(Vec<u8>, Arc<dyn NodeStore>, TrieConfig) -> Arc<dyn Any + Send + Sync> + Send + Sync>,
}

impl EntrySpec {
    pub fn new<Tag, K, V>(name: &'static str) -> Self
    where
        Tag: Send + Sync + 'static,
        K: ByteEncode + Send + Sync + 'static,
        V: ByteEncode + ByteDecode + Clone + Send + Sync + 'static,
    {
        EntrySpec {
            name,
            make_table: Arc::new(move |prefix, node_store, config| {
                let table: StateTable<Tag, K, V> = StateTable::new(prefix, name, node_store, config);
                Arc::new(table) as Arc<dyn Any + Send + Sync>
            }),
        }
    }

    pub fn instantiate(
        &self,
        prefix: Vec<u8>,
        node_store: Arc<dyn NodeStore>,
        config: TrieConfig,
    ) -> Arc<dyn Any + Send + Sync> {
        (self.make_table)(prefix, node_store, config)
    }
}

/// A handle to a named, type-erased set of tables, used to satisfy one
/// module's `Needs` with another module's `Owns` without either module
/// knowing the other's full schema. The dependency proof is realized
/// as a runtime name lookup plus a single `Any` downcast, checked once
/// when a table handle is first obtained rather than on every access.
#[derive(Clone, Default)]
pub struct TablesProvider {
    tables: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl TablesProvider {
    pub fn empty() -> Self {
        TablesProvider::default()
    }

    pub fn insert(&mut self, name: &'static str, table: Arc<dyn Any + Send + Sync>) {
        self.tables.insert(name, table);
    }

    /// Looks up `name` and downcasts it to `StateTable<Tag, K, V>`.
    pub fn table<Tag, K, V>(&self, name: &str) -> Result<Arc<StateTable<Tag, K, V>>, ModuleError>
    where
        Tag: 'static,
        K: 'static,
        V: 'static,
    {
        let handle = self
            .tables
            .get(name)
            .ok_or_else(|| ModuleError::MissingDependency {
                name: name.to_string(),
            })?;
        handle
            .clone()
            .downcast::<StateTable<Tag, K, V>>()
            .map_err(|_| ModuleError::WrongTableType {
                name: name.to_string(),
            })
    }

    /// Produces a provider containing only the named subset, the
    /// runtime realization of `narrow<Subset>`.
    pub fn narrow(&self, names: &[&'static str]) -> Result<TablesProvider, ModuleError> {
        let mut out = TablesProvider::empty();
        for &name in names {
            let handle = self
                .tables
                .get(name)
                .ok_or_else(|| ModuleError::MissingDependency {
                    name: name.to_string(),
                })?;
            out.insert(name, handle.clone());
        }
        Ok(out)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.keys().copied()
    }

    /// Unions two providers' name -> table maps; `other`'s entries win
    /// on a name collision. Used when merging a module's owned tables
    /// with its resolved dependencies before narrowing back down to a
    /// sub-reducer's own view (see `extend`).
    pub fn merge(&self, other: &TablesProvider) -> TablesProvider {
        let mut out = self.clone();
        for (name, handle) in &other.tables {
            out.tables.insert(name, handle.clone());
        }
        out
    }
}
