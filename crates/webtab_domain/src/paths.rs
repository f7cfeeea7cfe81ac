use std::path::{Path, PathBuf};

pub const WEBTAB_ROOT_ENV: &str = "WEBTAB_ROOT";
pub const WEBTAB_SYNC_DIR_ENV: &str = "WEBTAB_SYNC_DIR";

pub fn sqlite_path(webtab_root: &Path) -> PathBuf {
    webtab_root.join("webtab.db")
}

pub fn sync_entry_path(sync_dir: &Path, key: &str) -> PathBuf {
    sync_dir.join(format!("{key}.json"))
}
