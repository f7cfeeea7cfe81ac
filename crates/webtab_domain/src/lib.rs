mod model;
pub use model::{Category, Shortcut, UserSettings};

mod defaults;
pub use defaults::{
    DEFAULT_BACKGROUND, DEFAULT_USER_NAME, HOME_CATEGORY_ID, HOME_CATEGORY_TITLE, SHORTCUT_COLORS,
    default_categories, default_settings,
};

mod validate;
pub use validate::{ValidationError, categories_from_value, settings_from_value};

mod size_guard;
pub use size_guard::{SYNC_QUOTA_BYTES, SYNC_QUOTA_BYTES_PER_ITEM, SizeVerdict, guard};

mod backup;
pub use backup::{
    BACKUP_VERSION, BackupDocument, ImportedBackup, PRODUCT_NAME, backup_file_name, decode_backup,
};

mod legacy;
pub use legacy::{migrate_legacy_shortcuts, parse_legacy_shortcuts};

mod actions;
pub use actions::CollectionAction;

mod reducer;
pub use reducer::{CollectionError, apply_collection_action};

pub mod paths;

pub const CATEGORIES_KEY: &str = "categories";
pub const SETTINGS_KEY: &str = "settings";
pub const LEGACY_SHORTCUTS_KEY: &str = "shortcuts";
