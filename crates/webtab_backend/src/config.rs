use crate::env::optional_trimmed_path_from_env;
use crate::reconcile::Reconciler;
use crate::sqlite_store::SqliteStore;
use crate::sync_store::FolderSyncStore;
use anyhow::{Context as _, anyhow};
use std::path::PathBuf;
use webtab_domain::paths;

pub type DefaultReconciler = Reconciler<SqliteStore, FolderSyncStore>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub sync_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            root: resolve_webtab_root()?,
            sync_dir: optional_trimmed_path_from_env(paths::WEBTAB_SYNC_DIR_ENV)?,
        })
    }

    pub fn open(&self) -> anyhow::Result<DefaultReconciler> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        let local = SqliteStore::new(paths::sqlite_path(&self.root))
            .context("failed to init sqlite store")?;
        let sync = FolderSyncStore::new(self.sync_dir.clone());
        Ok(Reconciler::new(local, sync))
    }
}

fn resolve_webtab_root() -> anyhow::Result<PathBuf> {
    if let Some(root) = optional_trimmed_path_from_env(paths::WEBTAB_ROOT_ENV)? {
        return Ok(root);
    }

    let home = std::env::var_os("HOME").ok_or_else(|| anyhow!("HOME is not set"))?;
    Ok(PathBuf::from(home).join("webtab"))
}
