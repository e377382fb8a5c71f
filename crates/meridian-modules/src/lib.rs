mod blueprint;
mod compose;
mod error;
mod provider;
mod tx;

pub use blueprint::{Blueprint, Module};
pub use compose::{extend, ComposedBlueprint, ComposedModule};
pub use error::ModuleError;
pub use provider::{EntrySpec, TablesProvider};
pub use tx::{ModuleId, ModuleReducer, ReducerOutput, Signed, Tx};
