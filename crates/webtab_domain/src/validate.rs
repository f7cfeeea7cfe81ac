use crate::{Category, UserSettings};
use serde_json::{Map, Value};

/// A record that is well-formed JSON but does not have the shape of a
/// category collection, a settings object or a backup document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid data: {}", self.message)
    }
}

impl std::error::Error for ValidationError {}

fn require_string(obj: &Map<String, Value>, field: &str, at: &str) -> Result<(), ValidationError> {
    match obj.get(field) {
        Some(Value::String(_)) => Ok(()),
        _ => Err(ValidationError::new(format!(
            "{at} is missing string field `{field}`"
        ))),
    }
}

fn require_optional_string(
    obj: &Map<String, Value>,
    field: &str,
    at: &str,
) -> Result<(), ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ValidationError::new(format!(
            "{at} has non-string field `{field}`"
        ))),
    }
}

pub(crate) fn check_shortcut(value: &Value, at: &str) -> Result<(), ValidationError> {
    let Value::Object(obj) = value else {
        return Err(ValidationError::new(format!("{at} is not an object")));
    };
    require_string(obj, "id", at)?;
    require_string(obj, "title", at)?;
    require_string(obj, "url", at)?;
    require_optional_string(obj, "iconUrl", at)?;
    require_optional_string(obj, "color", at)?;
    Ok(())
}

/// Checks the category-level shape: string `id` and `title`, array `shortcuts`.
/// Returns the shortcut values for the caller to inspect further.
pub(crate) fn check_category<'a>(
    value: &'a Value,
    index: usize,
) -> Result<&'a [Value], ValidationError> {
    let at = format!("category #{index}");
    let Value::Object(obj) = value else {
        return Err(ValidationError::new(format!("{at} is not an object")));
    };
    require_string(obj, "id", &at)?;
    require_string(obj, "title", &at)?;
    match obj.get("shortcuts") {
        Some(Value::Array(shortcuts)) => Ok(shortcuts.as_slice()),
        _ => Err(ValidationError::new(format!(
            "{at} is missing array field `shortcuts`"
        ))),
    }
}

pub(crate) fn check_category_with_shortcuts(
    value: &Value,
    index: usize,
) -> Result<(), ValidationError> {
    let shortcuts = check_category(value, index)?;
    for (shortcut_index, shortcut) in shortcuts.iter().enumerate() {
        check_shortcut(shortcut, &format!("shortcut #{shortcut_index} of category #{index}"))?;
    }
    Ok(())
}

/// Gate applied to a categories value read back from a backend. Only a
/// non-empty array of fully well-typed categories passes.
pub fn categories_from_value(value: Value) -> Result<Vec<Category>, ValidationError> {
    let Value::Array(items) = &value else {
        return Err(ValidationError::new("categories is not an array"));
    };
    if items.is_empty() {
        return Err(ValidationError::new("categories is empty"));
    }
    for (index, item) in items.iter().enumerate() {
        check_category_with_shortcuts(item, index)?;
    }
    serde_json::from_value(value).map_err(|err| ValidationError::new(err.to_string()))
}

/// Gate applied to a settings value read back from a backend. Every field
/// must be present with its expected type.
pub fn settings_from_value(value: Value) -> Result<UserSettings, ValidationError> {
    let Value::Object(obj) = &value else {
        return Err(ValidationError::new("settings is not an object"));
    };
    require_string(obj, "userName", "settings")?;
    require_string(obj, "backgroundImageUrl", "settings")?;
    if !matches!(obj.get("useAiGreetings"), Some(Value::Bool(_))) {
        return Err(ValidationError::new(
            "settings is missing boolean field `useAiGreetings`",
        ));
    }
    serde_json::from_value(value).map_err(|err| ValidationError::new(err.to_string()))
}
