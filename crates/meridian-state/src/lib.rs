mod access_log;
mod error;
mod path;
mod store;
mod table;

pub use access_log::{detect_conflicts, AccessLog, Conflict, ConflictKind};
pub use error::SigilError;
pub use path::{encode_path, encode_segment, table_prefix, Path, PrefixCollision, PrefixFreePath};
pub use store::{sequence, StoreF, StoreState};
pub use table::{BrandedKey, Entry, StateTable};
