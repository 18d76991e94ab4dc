mod store;
mod persistence;
mod export;

pub use store::{DetachedStore, FileStore, KeyValueStore, MemoryStore};
pub use persistence::Persistence;
pub use export::{ExportBundle, ImportReport};
