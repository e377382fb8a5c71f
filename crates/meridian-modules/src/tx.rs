use crate::error::ModuleError;
use crate::provider::TablesProvider;
use meridian_crypto::{CryptoError, PublicKey, Signature};
use meridian_state::StoreF;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Identifies one sub-module within a `ComposedBlueprint`, so a
/// transaction can name which routed reducer should handle it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        ModuleId(id.into())
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transaction value together with the account signature over it.
/// Verification (recovering the signer, resolving a `keyId20`, checking
/// it against a `nameKey` table) is module-specific and lives in the
/// account/group reducers — this type only carries the signature
/// alongside the payload.
#[derive(Clone, Debug)]
pub struct Signed<T> {
    pub value: T,
    pub signature: Signature,
}

impl<T> Signed<T> {
    pub fn new(value: T, signature: Signature) -> Self {
        Signed { value, signature }
    }

    /// Recovers the public key that produced `signature` over `digest`
    /// (typically `keccak256` of the encoded value plus its envelope).
    pub fn recover_signer(&self, digest: &[u8; 32]) -> Result<PublicKey, CryptoError> {
        meridian_crypto::recover(&self.signature, digest)
    }
}

/// A transaction type's declared result and event types. `Reads` and
/// `Writes` (schema subsets, in the abstract design) have no separate
/// representation here: a reducer only ever holds `StateTable` handles
/// it was actually given, so the subset proof is enforced by ordinary
/// borrowing rather than a parallel runtime check — see DESIGN.md.
pub trait Tx: Send + Sync + 'static {
    type Result: Send + Sync + 'static;
    type Event: Send + Sync + 'static;
}

/// The outcome of applying one transaction: a typed result and the
/// events it raised, both erased to `Any` so that sub-modules with
/// different `Tx` types can be dispatched through one `ModuleReducer`
/// trait object.
pub struct ReducerOutput {
    pub result: Box<dyn Any + Send + Sync>,
    pub events: Vec<Box<dyn Any + Send + Sync>>,
}

impl ReducerOutput {
    pub fn new<R: Send + Sync + 'static, E: Send + Sync + 'static>(result: R, events: Vec<E>) -> Self {
        ReducerOutput {
            result: Box::new(result),
            events: events
                .into_iter()
                .map(|e| Box::new(e) as Box<dyn Any + Send + Sync>)
                .collect(),
        }
    }

    pub fn downcast_result<R: 'static>(self) -> Result<(R, Vec<Box<dyn Any + Send + Sync>>), ModuleError> {
        let result = self
            .result
            .downcast::<R>()
            .map_err(|_| ModuleError::WrongTxType)?;
        Ok((*result, self.events))
    }
}

/// A path-bound reducer, erased over its concrete transaction type so
/// that a `ComposedBlueprint` can hold several unrelated reducers and
/// route between them by `ModuleId`.
///
/// `owned`/`needs` and `tx` are taken by value (both `TablesProvider`
/// and `Arc<dyn Any>` are cheap to clone) rather than by reference:
/// the `StoreF` this returns may run well after the call to `apply`
/// returns, so everything it closes over has to be owned, not
/// borrowed.
pub trait ModuleReducer: Send + Sync {
    fn apply(
        &self,
        owned: TablesProvider,
        needs: TablesProvider,
        tx: Arc<dyn Any + Send + Sync>,
    ) -> StoreF<Result<ReducerOutput, ModuleError>>;
}
