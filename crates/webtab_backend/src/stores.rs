use crate::error::StorageError;
use std::future::Future;

/// Fast key-value area on this device. Always present, but individual calls
/// may still fail (for example when the database file cannot be opened).
/// Implementations must not block the async runtime.
pub trait LocalStore: Send + Sync {
    fn read(&self, key: &str) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;

    fn write(&self, key: &str, value: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Quota-limited key-value area shared across devices. May be missing in
/// the current runtime, in which case reads resolve to `None` and writes
/// succeed without doing anything. No read-after-write guarantee.
pub trait SyncStore: Send + Sync {
    fn is_available(&self) -> bool;

    fn read(&self, key: &str)
    -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    fn write(&self, key: &str, value: &str)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}
