use meridian_state::{PrefixCollision, SigilError};
use thiserror::Error;

/// Failures raised while mounting a blueprint or dispatching a
/// transaction through a mounted module, distinct from `SigilError`
/// (which covers failures *within* a reducer's table operations).
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("duplicate table name {name:?} in Owns")]
    DuplicateName { name: String },

    #[error("dependency {name:?} was not supplied by the enclosing composition")]
    MissingDependency { name: String },

    #[error("table {name:?} exists but was requested at the wrong key/value type")]
    WrongTableType { name: String },

    #[error(transparent)]
    PrefixCollision(#[from] PrefixCollision),

    #[error("no sub-module registered for module id {0:?}")]
    NoRoute(String),

    #[error("transaction value was not the type this reducer expects")]
    WrongTxType,

    #[error(transparent)]
    Sigil(#[from] SigilError),
}
