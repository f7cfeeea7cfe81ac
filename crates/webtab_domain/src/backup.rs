use crate::validate::{ValidationError, check_category};
use crate::{Category, UserSettings};
use serde_json::Value;

pub const PRODUCT_NAME: &str = "webtab";
pub const BACKUP_VERSION: &str = "1.0";

#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    pub export_date: String,
    pub categories: Vec<Category>,
    pub settings: UserSettings,
}

impl BackupDocument {
    pub fn new(categories: Vec<Category>, settings: UserSettings, export_date: String) -> Self {
        Self {
            version: BACKUP_VERSION.to_owned(),
            export_date,
            categories,
            settings,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Records recovered from a backup document, ready to be persisted.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct ImportedBackup {
    pub categories: Vec<Category>,
    pub settings: UserSettings,
}

/// `date` is expected as `YYYY-MM-DD`.
pub fn backup_file_name(date: &str) -> String {
    format!("{PRODUCT_NAME}-backup-{date}.json")
}

/// Parses and validates a backup document.
///
/// Only the top-level shape is mandatory: `categories` must be an array whose
/// entries carry string `id`/`title` and an array of well-typed shortcuts, and
/// `settings` must be an object. Missing settings fields fall back to the
/// defaults; `version` and `exportDate` are informational and not required.
pub fn decode_backup(text: &str) -> Result<ImportedBackup, ValidationError> {
    let document: Value = serde_json::from_str(text)
        .map_err(|err| ValidationError::new(format!("backup is not valid JSON: {err}")))?;
    let Value::Object(mut document) = document else {
        return Err(ValidationError::new("backup is not a JSON object"));
    };

    let categories = document.remove("categories").unwrap_or(Value::Null);
    let Value::Array(items) = &categories else {
        return Err(ValidationError::new("categories is not an array"));
    };
    for (index, item) in items.iter().enumerate() {
        check_category(item, index)?;
    }

    let settings = document.remove("settings").unwrap_or(Value::Null);
    if !settings.is_object() {
        return Err(ValidationError::new("settings is not an object"));
    }

    let categories: Vec<Category> =
        serde_json::from_value(categories).map_err(|err| ValidationError::new(err.to_string()))?;
    let settings: UserSettings = serde_json::from_value(settings)
        .map_err(|err| ValidationError::new(format!("settings: {err}")))?;

    Ok(ImportedBackup {
        categories,
        settings,
    })
}
