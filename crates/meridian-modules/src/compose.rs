use crate::blueprint::{Blueprint, Module};
use crate::error::ModuleError;
use crate::provider::TablesProvider;
use crate::tx::{ModuleId, ModuleReducer, ReducerOutput};
use meridian_state::{Path, PrefixFreePath, StoreF};
use meridian_trie::{NodeStore, TrieConfig};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes a transaction to one of several sub-modules by `ModuleId`.
/// The primary composition mechanism for mounting more than one
/// blueprint under a shared parent: each route gets its own path (and
/// therefore its own prefix-free table namespace), and dispatch reads
/// the transaction's `ModuleId` to pick the matching sub-module.
///
/// `supplied` is passed unchanged to every route: a route whose
/// `Needs` depends on a sibling route's `Owns` must have that
/// dependency mounted and supplied ahead of time, not mounted
/// alongside it in the same call.
#[derive(Default)]
pub struct ComposedBlueprint {
    routes: Vec<(ModuleId, Path, Blueprint)>,
}

impl ComposedBlueprint {
    pub fn new() -> Self {
        ComposedBlueprint { routes: Vec::new() }
    }

    pub fn route(mut self, id: ModuleId, path: Path, blueprint: Blueprint) -> Self {
        self.routes.push((id, path, blueprint));
        self
    }

    pub fn mount(
        &self,
        node_store: Arc<dyn NodeStore>,
        config: TrieConfig,
        registrar: &mut PrefixFreePath,
        supplied: &TablesProvider,
    ) -> Result<ComposedModule, ModuleError> {
        let mut modules = HashMap::new();
        for (id, path, blueprint) in &self.routes {
            let module = blueprint.mount(path, node_store.clone(), config, registrar, supplied)?;
            modules.insert(id.0.clone(), module);
        }
        Ok(ComposedModule { modules })
    }
}

/// A mounted `ComposedBlueprint`: one concrete `Module` per route.
pub struct ComposedModule {
    modules: HashMap<String, Module>,
}

impl ComposedModule {
    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.get(&id.0)
    }

    pub fn dispatch(
        &self,
        id: &ModuleId,
        tx: Arc<dyn Any + Send + Sync>,
    ) -> Result<StoreF<Result<ReducerOutput, ModuleError>>, ModuleError> {
        self.modules
            .get(&id.0)
            .map(|module| module.dispatch(tx))
            .ok_or_else(|| ModuleError::NoRoute(id.0.clone()))
    }
}

/// Merges two blueprints at the same path into one whose schema is the
/// concatenation of both: `Owns` and `Needs` are combined, and the
/// merged reducer tries the first sub-reducer and falls back to the
/// second on any failure.
///
/// Deprecated in favor of [`ComposedBlueprint`]'s routed dispatch,
/// which does not need to guess whether a failure means "wrong
/// sub-module" or "genuine error." Retained for the narrow two-blueprint
/// fallback case.
#[deprecated(note = "prefer ComposedBlueprint's routed dispatch by ModuleId")]
pub fn extend(first: Blueprint, second: Blueprint) -> Blueprint {
    let first_owns: Vec<&'static str> = first.owns.iter().map(|e| e.name).collect();
    let first_needs = first.needs.clone();
    let second_owns: Vec<&'static str> = second.owns.iter().map(|e| e.name).collect();
    let second_needs = second.needs.clone();

    let mut owns = first.owns;
    owns.extend(second.owns);
    let mut needs = first.needs;
    for name in second.needs {
        if !needs.contains(&name) {
            needs.push(name);
        }
    }

    let reducer = Arc::new(FallbackReducer {
        first: first.reducer,
        first_owns,
        first_needs,
        second: second.reducer,
        second_owns,
        second_needs,
    });

    Blueprint::new(
        format!("{}+{}", first.module_name, second.module_name),
        owns,
        needs,
        reducer,
    )
}

struct FallbackReducer {
    first: Arc<dyn ModuleReducer>,
    first_owns: Vec<&'static str>,
    first_needs: Vec<&'static str>,
    second: Arc<dyn ModuleReducer>,
    second_owns: Vec<&'static str>,
    second_needs: Vec<&'static str>,
}

/// Narrows the union of `owned` and `needs` down to `own_names` and
/// `need_names` respectively. A merged blueprint's sub-reducer may
/// depend on a table that used to be the *other* sub-blueprint's own
/// table before merging, so the lookup has to consider both.
fn view_for(
    owned: &TablesProvider,
    needs: &TablesProvider,
    own_names: &[&'static str],
    need_names: &[&'static str],
) -> Result<(TablesProvider, TablesProvider), ModuleError> {
    let all = owned.merge(needs);
    let owned_view = all.narrow(own_names)?;
    let needs_view = all.narrow(need_names)?;
    Ok((owned_view, needs_view))
}

impl ModuleReducer for FallbackReducer {
    fn apply(
        &self,
        owned: TablesProvider,
        needs: TablesProvider,
        tx: Arc<dyn Any + Send + Sync>,
    ) -> StoreF<Result<ReducerOutput, ModuleError>> {
        let (first_owned, first_needs) = match view_for(&owned, &needs, &self.first_owns, &self.first_needs) {
            Ok(views) => views,
            Err(e) => return StoreF::pure(Err(e)),
        };

        let first = self.first.clone();
        let second = self.second.clone();
        let second_owns = self.second_owns.clone();
        let second_needs = self.second_needs.clone();
        let tx_for_second = tx.clone();

        StoreF::from_fn(move |state| {
            let (state, first_result) = first.apply(first_owned, first_needs, tx).run(state)?;
            match first_result {
                Ok(output) => Ok((state, Ok(output))),
                Err(_first_err) => {
                    let (second_owned, second_needs_view) =
                        match view_for(&owned, &needs, &second_owns, &second_needs) {
                            Ok(views) => views,
                            Err(e) => return Ok((state, Err(e))),
                        };
                    let (state, second_result) =
                        second.apply(second_owned, second_needs_view, tx_for_second).run(state)?;
                    Ok((state, second_result))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::Blueprint;
    use crate::provider::EntrySpec;
    use meridian_trie::InMemoryNodeStore;

    struct TagA;
    struct TagB;

    struct TxA;
    struct TxB;

    struct ReducerA;
    impl ModuleReducer for ReducerA {
        fn apply(
            &self,
            _owned: TablesProvider,
            _needs: TablesProvider,
            tx: Arc<dyn Any + Send + Sync>,
        ) -> StoreF<Result<ReducerOutput, ModuleError>> {
            if tx.is::<TxA>() {
                StoreF::pure(Ok(ReducerOutput::new("a", Vec::<()>::new())))
            } else {
                StoreF::pure(Err(ModuleError::WrongTxType))
            }
        }
    }

    struct ReducerB;
    impl ModuleReducer for ReducerB {
        fn apply(
            &self,
            _owned: TablesProvider,
            _needs: TablesProvider,
            tx: Arc<dyn Any + Send + Sync>,
        ) -> StoreF<Result<ReducerOutput, ModuleError>> {
            if tx.is::<TxB>() {
                StoreF::pure(Ok(ReducerOutput::new("b", Vec::<()>::new())))
            } else {
                StoreF::pure(Err(ModuleError::WrongTxType))
            }
        }
    }

    fn blueprint_a() -> Blueprint {
        Blueprint::new(
            "a",
            vec![EntrySpec::new::<TagA, Vec<u8>, Vec<u8>>("a_table")],
            vec![],
            Arc::new(ReducerA),
        )
    }

    fn blueprint_b() -> Blueprint {
        Blueprint::new(
            "b",
            vec![EntrySpec::new::<TagB, Vec<u8>, Vec<u8>>("b_table")],
            vec![],
            Arc::new(ReducerB),
        )
    }

    #[test]
    fn composed_blueprint_routes_by_module_id() {
        let node_store: Arc<dyn NodeStore> = Arc::new(InMemoryNodeStore::new());
        let mut registrar = PrefixFreePath::new();
        let composed = ComposedBlueprint::new()
            .route(ModuleId::new("a"), Path::new(["app", "a"]), blueprint_a())
            .route(ModuleId::new("b"), Path::new(["app", "b"]), blueprint_b())
            .mount(
                node_store,
                TrieConfig::default(),
                &mut registrar,
                &TablesProvider::empty(),
            )
            .unwrap();

        let state = meridian_state::StoreState::genesis();
        let (_, result) = composed
            .dispatch(&ModuleId::new("b"), Arc::new(TxB))
            .unwrap()
            .run(state)
            .unwrap();
        let (value, _events) = result.unwrap().downcast_result::<&str>().unwrap();
        assert_eq!(value, "b");
    }

    #[test]
    fn dispatch_to_unknown_route_fails() {
        let node_store: Arc<dyn NodeStore> = Arc::new(InMemoryNodeStore::new());
        let mut registrar = PrefixFreePath::new();
        let composed = ComposedBlueprint::new()
            .route(ModuleId::new("a"), Path::new(["app", "a"]), blueprint_a())
            .mount(
                node_store,
                TrieConfig::default(),
                &mut registrar,
                &TablesProvider::empty(),
            )
            .unwrap();

        assert!(composed.dispatch(&ModuleId::new("missing"), Arc::new(TxA)).is_err());
    }

    #[allow(deprecated)]
    #[test]
    fn extend_falls_back_to_the_second_reducer_on_mismatch() {
        let merged = extend(blueprint_a(), blueprint_b());
        let node_store: Arc<dyn NodeStore> = Arc::new(InMemoryNodeStore::new());
        let mut registrar = PrefixFreePath::new();
        let module = merged
            .mount(
                &Path::new(["app"]),
                node_store,
                TrieConfig::default(),
                &mut registrar,
                &TablesProvider::empty(),
            )
            .unwrap();

        let state = meridian_state::StoreState::genesis();
        let (_, result) = module.dispatch(Arc::new(TxB)).run(state).unwrap();
        let (value, _events) = result.unwrap().downcast_result::<&str>().unwrap();
        assert_eq!(value, "b");
    }
}
