use crate::defaults::default_settings;

#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortcut {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Preferred over `color` when rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Background of the fallback initial avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub title: String,
    pub shortcuts: Vec<Shortcut>,
}

impl Category {
    pub fn is_home(&self) -> bool {
        self.id == crate::HOME_CATEGORY_ID
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub user_name: String,
    pub background_image_url: String,
    pub use_ai_greetings: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        default_settings()
    }
}
