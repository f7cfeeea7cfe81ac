use crate::error::StorageError;
use crate::stores::SyncStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use webtab_domain::paths::sync_entry_path;
use webtab_domain::{SYNC_QUOTA_BYTES, SYNC_QUOTA_BYTES_PER_ITEM};

/// Sync backend over a directory that some external agent (a cloud drive
/// client, a network mount) replicates across devices. One file per key.
///
/// The directory is checked once on construction; a missing directory makes
/// the store unavailable for its whole lifetime.
#[derive(Clone, Debug)]
pub struct FolderSyncStore {
    dir: Option<PathBuf>,
}

impl FolderSyncStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        let dir = dir.filter(|dir| {
            let ok = dir.is_dir();
            if !ok {
                tracing::warn!(dir = %dir.display(), "sync directory does not exist");
            }
            ok
        });
        Self { dir }
    }

    /// Bytes used by every entry other than `key`, counted as key plus value.
    async fn bytes_in_use_except(dir: &Path, key: &str) -> Result<usize, StorageError> {
        let mut total = 0usize;
        let list_error = |err: std::io::Error| {
            StorageError::Backend(format!("failed to list {}: {err}", dir.display()))
        };
        let mut entries = tokio::fs::read_dir(dir).await.map_err(list_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if stem == key {
                continue;
            }
            let len = entry
                .metadata()
                .await
                .map(|meta| meta.len() as usize)
                .unwrap_or(0);
            total += stem.len() + len;
        }
        Ok(total)
    }
}

impl SyncStore for FolderSyncStore {
    fn is_available(&self) -> bool {
        self.dir.is_some()
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        let path = sync_entry_path(dir, key);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Backend(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };

        let bytes = key.len() + value.len();
        if bytes > SYNC_QUOTA_BYTES_PER_ITEM {
            return Err(StorageError::SizeExceeded {
                key: key.to_owned(),
                bytes,
                limit: SYNC_QUOTA_BYTES_PER_ITEM,
            });
        }
        let in_use = Self::bytes_in_use_except(dir, key).await?;
        if in_use + bytes > SYNC_QUOTA_BYTES {
            return Err(StorageError::Backend(format!(
                "quota exceeded: {} of {SYNC_QUOTA_BYTES} bytes",
                in_use + bytes
            )));
        }

        let path = sync_entry_path(dir, key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value.as_bytes()).await.map_err(|err| {
            StorageError::Backend(format!("failed to write {}: {err}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|err| {
            StorageError::Backend(format!("failed to replace {}: {err}", path.display()))
        })?;
        Ok(())
    }
}

/// In-process sync backend. Lets embedders run without a shared directory
/// and lets tests inject unavailability and failures.
#[derive(Debug, Default)]
pub struct MemorySyncStore {
    unavailable: bool,
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemorySyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .get(key)
            .cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Calls that reached the backend, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl SyncStore for MemorySyncStore {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.unavailable {
            return Ok(None);
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected read failure".to_owned()));
        }
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Ok(());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected write failure".to_owned()));
        }
        self.insert(key, value);
        Ok(())
    }
}
