use crate::error::ModuleError;
use crate::provider::{EntrySpec, TablesProvider};
use crate::tx::ModuleReducer;
use meridian_state::{Path, PrefixFreePath};
use meridian_trie::{NodeStore, TrieConfig};
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

/// An immutable, path-independent module description: the tables it
/// owns, the names of tables it needs from elsewhere, and the reducer
/// that processes transactions once both are resolved.
pub struct Blueprint {
    pub module_name: String,
    pub owns: Vec<EntrySpec>,
    pub needs: Vec<&'static str>,
    pub reducer: Arc<dyn ModuleReducer>,
}

impl Blueprint {
    pub fn new(
        module_name: impl Into<String>,
        owns: Vec<EntrySpec>,
        needs: Vec<&'static str>,
        reducer: Arc<dyn ModuleReducer>,
    ) -> Self {
        Blueprint {
            module_name: module_name.into(),
            owns,
            needs,
            reducer,
        }
    }

    fn check_unique_names(&self) -> Result<(), ModuleError> {
        let mut seen = HashSet::new();
        for entry in &self.owns {
            if !seen.insert(entry.name) {
                return Err(ModuleError::DuplicateName {
                    name: entry.name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Binds this blueprint to `path`: computes each owned entry's table
    /// prefix (registering it with `registrar` to enforce prefix
    /// freedom), instantiates its `StateTable`, and resolves `needs`
    /// against `supplied`.
    pub fn mount(
        &self,
        path: &Path,
        node_store: Arc<dyn NodeStore>,
        config: TrieConfig,
        registrar: &mut PrefixFreePath,
        supplied: &TablesProvider,
    ) -> Result<Module, ModuleError> {
        self.check_unique_names()?;

        let mut owned = TablesProvider::empty();
        for entry in &self.owns {
            let prefix = registrar.register(path, entry.name)?;
            tracing::debug!(module = %self.module_name, table = entry.name, prefix_len = prefix.len(), "mounted table");
            let table = entry.instantiate(prefix, node_store.clone(), config);
            owned.insert(entry.name, table);
        }

        let needed = supplied.narrow(&self.needs)?;
        tracing::debug!(module = %self.module_name, path = ?path.segments(), "blueprint mounted");

        Ok(Module {
            module_name: self.module_name.clone(),
            path: path.clone(),
            owned,
            needed,
            reducer: self.reducer.clone(),
        })
    }
}

/// A blueprint bound to a path: its owned tables have concrete prefixes
/// and its dependencies have been resolved against a supplied provider.
#[derive(Clone)]
pub struct Module {
    pub module_name: String,
    pub path: Path,
    pub owned: TablesProvider,
    pub needed: TablesProvider,
    reducer: Arc<dyn ModuleReducer>,
}

impl Module {
    pub fn dispatch(
        &self,
        tx: Arc<dyn Any + Send + Sync>,
    ) -> meridian_state::StoreF<Result<crate::tx::ReducerOutput, ModuleError>> {
        self.reducer.apply(self.owned.clone(), self.needed.clone(), tx)
    }

    /// Exposes this module's owned tables under their names, so a
    /// sibling module's `Needs` can be satisfied by supplying
    /// `module.owned` (or a `narrow`ed view of it) when mounting it.
    pub fn provided_tables(&self) -> &TablesProvider {
        &self.owned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::ReducerOutput;
    use meridian_state::StoreF;
    use meridian_trie::InMemoryNodeStore;

    struct CounterTag;

    struct NoopReducer;
    impl ModuleReducer for NoopReducer {
        fn apply(
            &self,
            _owned: TablesProvider,
            _needs: TablesProvider,
            _tx: Arc<dyn Any + Send + Sync>,
        ) -> StoreF<Result<ReducerOutput, ModuleError>> {
            StoreF::pure(Ok(ReducerOutput::new((), Vec::<()>::new())))
        }
    }

    #[test]
    fn mounting_computes_prefixes_and_rejects_duplicate_owned_names() {
        let blueprint = Blueprint::new(
            "counters",
            vec![
                EntrySpec::new::<CounterTag, Vec<u8>, Vec<u8>>("counters"),
                EntrySpec::new::<CounterTag, Vec<u8>, Vec<u8>>("counters"),
            ],
            vec![],
            Arc::new(NoopReducer),
        );

        let node_store: Arc<dyn NodeStore> = Arc::new(InMemoryNodeStore::new());
        let mut registrar = PrefixFreePath::new();
        let err = blueprint
            .mount(
                &Path::new(["app"]),
                node_store,
                TrieConfig::default(),
                &mut registrar,
                &TablesProvider::empty(),
            )
            .unwrap_err();
        assert!(matches!(err, ModuleError::DuplicateName { .. }));
    }

    #[test]
    fn mounting_fails_on_unsatisfied_dependency() {
        let blueprint = Blueprint::new(
            "needs-other",
            vec![],
            vec!["otherTable"],
            Arc::new(NoopReducer),
        );
        let node_store: Arc<dyn NodeStore> = Arc::new(InMemoryNodeStore::new());
        let mut registrar = PrefixFreePath::new();
        let err = blueprint
            .mount(
                &Path::new(["app"]),
                node_store,
                TrieConfig::default(),
                &mut registrar,
                &TablesProvider::empty(),
            )
            .unwrap_err();
        assert!(matches!(err, ModuleError::MissingDependency { .. }));
    }

    #[test]
    fn two_modules_at_the_same_path_collide_on_prefix() {
        let make = || {
            Blueprint::new(
                "dup",
                vec![EntrySpec::new::<CounterTag, Vec<u8>, Vec<u8>>("t")],
                vec![],
                Arc::new(NoopReducer) as Arc<dyn ModuleReducer>,
            )
        };
        let node_store: Arc<dyn NodeStore> = Arc::new(InMemoryNodeStore::new());
        let mut registrar = PrefixFreePath::new();
        let path = Path::new(["app"]);
        make()
            .mount(
                &path,
                node_store.clone(),
                TrieConfig::default(),
                &mut registrar,
                &TablesProvider::empty(),
            )
            .unwrap();
        let err = make()
            .mount(
                &path,
                node_store,
                TrieConfig::default(),
                &mut registrar,
                &TablesProvider::empty(),
            )
            .unwrap_err();
        assert!(matches!(err, ModuleError::PrefixCollision(_)));
    }
}
