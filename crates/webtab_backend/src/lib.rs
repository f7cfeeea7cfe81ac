mod config;
mod env;
mod error;
mod ids;
mod reconcile;
mod sqlite_store;
mod stores;
mod sync_store;
mod time;

#[cfg(test)]
mod test_support;

pub use config::{DefaultReconciler, StorageConfig};
pub use error::StorageError;
pub use ids::{new_entity_id, random_shortcut_color};
pub use reconcile::{ExportedBackup, Reconciler, RecordState, SaveOutcome, SyncOutcome};
pub use sqlite_store::SqliteStore;
pub use stores::{LocalStore, SyncStore};
pub use sync_store::{FolderSyncStore, MemorySyncStore};
