use crate::error::StorageError;
use crate::stores::{LocalStore, SyncStore};
use crate::time::{iso8601_date, iso8601_timestamp};
use anyhow::Context as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Mutex;
use time::OffsetDateTime;
use webtab_domain::{
    BackupDocument, CATEGORIES_KEY, Category, ImportedBackup, LEGACY_SHORTCUTS_KEY, SETTINGS_KEY,
    SYNC_QUOTA_BYTES_PER_ITEM, UserSettings, ValidationError, backup_file_name,
    categories_from_value, decode_backup, default_categories, default_settings, guard,
    migrate_legacy_shortcuts, parse_legacy_shortcuts, settings_from_value,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordState {
    Unloaded,
    /// The local value has been consulted but the sync backend has not.
    LocalOnly,
    Reconciled,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncOutcome {
    Written,
    Unavailable,
    TooLarge { bytes: usize },
    /// The value is empty and would never pass the remote read gate.
    Skipped,
    Failed,
}

/// What happened to each backend during a save. Failures are already logged.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SaveOutcome {
    pub local_written: bool,
    pub sync: SyncOutcome,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportedBackup {
    pub file_name: String,
    pub contents: String,
}

trait Record: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KEY: &'static str;

    /// Structural gate for values read back from the sync backend.
    fn from_remote(value: Value) -> Result<Self, ValidationError>;

    fn fallback() -> Self;

    fn is_usable(&self) -> bool {
        true
    }
}

impl Record for Vec<Category> {
    const KEY: &'static str = CATEGORIES_KEY;

    fn from_remote(value: Value) -> Result<Self, ValidationError> {
        categories_from_value(value)
    }

    fn fallback() -> Self {
        default_categories()
    }

    fn is_usable(&self) -> bool {
        !self.is_empty()
    }
}

impl Record for UserSettings {
    const KEY: &'static str = SETTINGS_KEY;

    fn from_remote(value: Value) -> Result<Self, ValidationError> {
        settings_from_value(value)
    }

    fn fallback() -> Self {
        default_settings()
    }
}

struct Slot<T> {
    cached: Option<T>,
    state: RecordState,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            cached: None,
            state: RecordState::Unloaded,
        }
    }
}

/// Owns the read and write policy for categories and settings across a local
/// store and a sync store.
///
/// Reads prefer a structurally valid sync value, repairing the local copy
/// from it, then fall back to the local value, the legacy shortcut list and
/// finally the built-in defaults. Writes go to the in-memory cache, then the
/// local store, then (size permitting) the sync store; the two backend writes
/// are independent and neither failure is surfaced.
pub struct Reconciler<L, S> {
    local: L,
    sync: S,
    sync_available: bool,
    categories: Mutex<Slot<Vec<Category>>>,
    settings: Mutex<Slot<UserSettings>>,
}

impl<L: LocalStore, S: SyncStore> Reconciler<L, S> {
    pub fn new(local: L, sync: S) -> Self {
        let sync_available = sync.is_available();
        if !sync_available {
            tracing::debug!(error = %StorageError::BackendUnavailable, "running local-only");
        }
        Self {
            local,
            sync,
            sync_available,
            categories: Mutex::new(Slot::default()),
            settings: Mutex::new(Slot::default()),
        }
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn sync(&self) -> &S {
        &self.sync
    }

    pub fn sync_available(&self) -> bool {
        self.sync_available
    }

    pub fn categories_state(&self) -> RecordState {
        slot_state(&self.categories)
    }

    pub fn settings_state(&self) -> RecordState {
        slot_state(&self.settings)
    }

    pub async fn load_categories(&self) -> Vec<Category> {
        let categories = match self.reconcile(&self.categories).await {
            Some(categories) => categories,
            None => match self.migrate_legacy().await {
                Some(categories) => categories,
                None => default_categories(),
            },
        };
        finish_load(&self.categories, &categories);
        categories
    }

    pub async fn save_categories(&self, categories: Vec<Category>) -> SaveOutcome {
        self.save_record(&self.categories, categories).await
    }

    /// Never reaches the sync backend.
    pub async fn load_categories_cached(&self) -> Vec<Category> {
        self.load_cached(&self.categories).await
    }

    pub async fn load_settings(&self) -> UserSettings {
        let settings = self
            .reconcile(&self.settings)
            .await
            .unwrap_or_else(default_settings);
        finish_load(&self.settings, &settings);
        settings
    }

    pub async fn save_settings(&self, settings: UserSettings) -> SaveOutcome {
        self.save_record(&self.settings, settings).await
    }

    /// Never reaches the sync backend.
    pub async fn load_settings_cached(&self) -> UserSettings {
        self.load_cached(&self.settings).await
    }

    /// Drops both cached records. Load states are kept.
    pub fn invalidate(&self) {
        lock(&self.categories).cached = None;
        lock(&self.settings).cached = None;
    }

    pub async fn export_backup(&self) -> anyhow::Result<ExportedBackup> {
        self.export_backup_at(OffsetDateTime::now_utc()).await
    }

    pub async fn export_backup_at(&self, at: OffsetDateTime) -> anyhow::Result<ExportedBackup> {
        let categories = self.load_categories().await;
        let settings = self.load_settings().await;
        let export_date = iso8601_timestamp(at).context("failed to format export date")?;
        let contents = BackupDocument::new(categories, settings, export_date)
            .to_json()
            .context("failed to serialize backup")?;
        let date = iso8601_date(at).context("failed to format export day")?;
        Ok(ExportedBackup {
            file_name: backup_file_name(&date),
            contents,
        })
    }

    /// Validates before touching anything: a rejected document leaves every
    /// backend and cache as it was.
    pub async fn import_backup(&self, text: &str) -> Result<ImportedBackup, ValidationError> {
        let imported = match decode_backup(text) {
            Ok(imported) => imported,
            Err(err) => {
                tracing::warn!(error = %err, "rejected backup import");
                return Err(err);
            }
        };

        self.save_categories(imported.categories.clone()).await;
        self.save_settings(imported.settings.clone()).await;
        tracing::info!(categories = imported.categories.len(), "imported backup");
        Ok(imported)
    }

    async fn reconcile<R: Record>(&self, slot: &Mutex<Slot<R>>) -> Option<R> {
        let local = self.read_local::<R>().await;
        mark_local_read(slot);

        let Some(remote) = self.read_remote::<R>().await else {
            return local;
        };
        if local.as_ref() != Some(&remote) {
            tracing::debug!(key = R::KEY, "sync value replaces local value");
            self.write_local(R::KEY, &remote).await;
        }
        Some(remote)
    }

    async fn migrate_legacy(&self) -> Option<Vec<Category>> {
        let raw = match self.local.read(LEGACY_SHORTCUTS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(
                    key = LEGACY_SHORTCUTS_KEY,
                    error = %format!("{err:#}"),
                    "failed to read legacy shortcuts"
                );
                return None;
            }
        };
        let shortcuts = match parse_legacy_shortcuts(&raw) {
            Ok(shortcuts) => shortcuts,
            Err(err) => {
                let err = StorageError::Parse {
                    key: LEGACY_SHORTCUTS_KEY.to_owned(),
                    message: err.to_string(),
                };
                tracing::warn!(error = %err, "ignoring legacy shortcuts");
                return None;
            }
        };

        tracing::info!(shortcuts = shortcuts.len(), "migrating legacy shortcut list");
        let categories = migrate_legacy_shortcuts(shortcuts);
        self.save_categories(categories.clone()).await;
        if let Err(err) = self.local.remove(LEGACY_SHORTCUTS_KEY).await {
            tracing::warn!(
                key = LEGACY_SHORTCUTS_KEY,
                error = %format!("{err:#}"),
                "failed to remove legacy shortcuts"
            );
        }
        Some(categories)
    }

    async fn read_local<R: Record>(&self) -> Option<R> {
        let raw = match self.local.read(R::KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(
                    key = R::KEY,
                    error = %format!("{err:#}"),
                    "failed to read local value"
                );
                return None;
            }
        };
        match serde_json::from_str::<R>(&raw) {
            Ok(value) if value.is_usable() => Some(value),
            Ok(_) => {
                tracing::debug!(key = R::KEY, "local value is empty");
                None
            }
            Err(err) => {
                let err = StorageError::Parse {
                    key: R::KEY.to_owned(),
                    message: err.to_string(),
                };
                tracing::warn!(error = %err, "discarding local value");
                None
            }
        }
    }

    async fn read_remote<R: Record>(&self) -> Option<R> {
        if !self.sync_available {
            return None;
        }
        let raw = match self.sync.read(R::KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key = R::KEY, error = %err, "sync read failed");
                return None;
            }
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                let err = StorageError::Parse {
                    key: R::KEY.to_owned(),
                    message: err.to_string(),
                };
                tracing::warn!(error = %err, "ignoring sync value");
                return None;
            }
        };
        match R::from_remote(value) {
            Ok(record) => Some(record),
            Err(err) => {
                let err = StorageError::from(err);
                tracing::warn!(key = R::KEY, error = %err, "ignoring sync value");
                None
            }
        }
    }

    async fn write_local<R: Record>(&self, key: &str, value: &R) -> bool {
        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(err) => {
                tracing::error!(key, error = %err, "failed to serialize value");
                return false;
            }
        };
        match self.local.write(key, &serialized).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(key, error = %format!("{err:#}"), "failed to write local value");
                false
            }
        }
    }

    /// An unusable value (an empty collection) is written locally only and
    /// is never cached, so every read path substitutes the fallback for it.
    async fn save_record<R: Record>(&self, slot: &Mutex<Slot<R>>, value: R) -> SaveOutcome {
        let usable = value.is_usable();
        lock(slot).cached = usable.then(|| value.clone());

        let serialized = match serde_json::to_string(&value) {
            Ok(serialized) => serialized,
            Err(err) => {
                tracing::error!(key = R::KEY, error = %err, "failed to serialize value");
                return SaveOutcome {
                    local_written: false,
                    sync: SyncOutcome::Failed,
                };
            }
        };

        let local_written = match self.local.write(R::KEY, &serialized).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(
                    key = R::KEY,
                    error = %format!("{err:#}"),
                    "failed to write local value"
                );
                false
            }
        };
        let sync = if usable {
            self.push_remote(R::KEY, &serialized).await
        } else {
            tracing::debug!(key = R::KEY, "not syncing empty value");
            SyncOutcome::Skipped
        };

        SaveOutcome {
            local_written,
            sync,
        }
    }

    /// Best-effort: every failure is logged here and reported only as an outcome.
    async fn push_remote(&self, key: &str, serialized: &str) -> SyncOutcome {
        if !self.sync_available {
            return SyncOutcome::Unavailable;
        }

        let verdict = guard(key, serialized);
        if !verdict.eligible {
            let err = StorageError::SizeExceeded {
                key: key.to_owned(),
                bytes: verdict.bytes,
                limit: SYNC_QUOTA_BYTES_PER_ITEM,
            };
            tracing::warn!(error = %err, "keeping value local-only");
            return SyncOutcome::TooLarge {
                bytes: verdict.bytes,
            };
        }

        match self.sync.write(key, serialized).await {
            Ok(()) => SyncOutcome::Written,
            Err(err) => {
                tracing::warn!(key, error = %err, "sync write failed");
                SyncOutcome::Failed
            }
        }
    }

    async fn load_cached<R: Record>(&self, slot: &Mutex<Slot<R>>) -> R {
        let cached = lock(slot).cached.clone();
        if let Some(cached) = cached {
            return cached;
        }
        match self.read_local::<R>().await {
            Some(value) => {
                let mut slot = lock(slot);
                slot.cached = Some(value.clone());
                if slot.state == RecordState::Unloaded {
                    slot.state = RecordState::LocalOnly;
                }
                value
            }
            None => R::fallback(),
        }
    }
}

fn lock<T>(slot: &Mutex<Slot<T>>) -> std::sync::MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(|err| err.into_inner())
}

fn slot_state<T>(slot: &Mutex<Slot<T>>) -> RecordState {
    lock(slot).state
}

fn mark_local_read<T>(slot: &Mutex<Slot<T>>) {
    let mut slot = lock(slot);
    if slot.state == RecordState::Unloaded {
        slot.state = RecordState::LocalOnly;
    }
}

fn finish_load<T: Clone>(slot: &Mutex<Slot<T>>, value: &T) {
    let mut slot = lock(slot);
    slot.cached = Some(value.clone());
    slot.state = RecordState::Reconciled;
}
