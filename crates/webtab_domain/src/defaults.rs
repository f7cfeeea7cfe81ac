use crate::{Category, Shortcut, UserSettings};

pub const HOME_CATEGORY_ID: &str = "home";
pub const HOME_CATEGORY_TITLE: &str = "Home";
pub const DEFAULT_USER_NAME: &str = "User";
pub const DEFAULT_BACKGROUND: &str = "https://picsum.photos/1920/1080";

/// Palette offered for fallback avatars.
pub const SHORTCUT_COLORS: [&str; 10] = [
    "#ef4444", "#f97316", "#f59e0b", "#10b981", "#06b6d4", "#3b82f6", "#6366f1", "#8b5cf6",
    "#d946ef", "#f43f5e",
];

fn shortcut(id: &str, title: &str, url: &str, color: &str) -> Shortcut {
    Shortcut {
        id: id.to_owned(),
        title: title.to_owned(),
        url: url.to_owned(),
        icon_url: None,
        color: Some(color.to_owned()),
    }
}

pub fn default_categories() -> Vec<Category> {
    vec![
        Category {
            id: HOME_CATEGORY_ID.to_owned(),
            title: HOME_CATEGORY_TITLE.to_owned(),
            shortcuts: vec![
                shortcut("1", "Google", "https://www.google.com", "#4285F4"),
                shortcut("2", "YouTube", "https://www.youtube.com", "#FF0000"),
                shortcut("3", "GitHub", "https://github.com", "#24292e"),
                shortcut("4", "ChatGPT", "https://chat.openai.com", "#10A37F"),
            ],
        },
        Category {
            id: "social".to_owned(),
            title: "Social".to_owned(),
            shortcuts: vec![
                shortcut("5", "Twitter", "https://twitter.com", "#1DA1F2"),
                shortcut("6", "Reddit", "https://reddit.com", "#FF4500"),
            ],
        },
    ]
}

pub fn default_settings() -> UserSettings {
    UserSettings {
        user_name: DEFAULT_USER_NAME.to_owned(),
        background_image_url: DEFAULT_BACKGROUND.to_owned(),
        use_ai_greetings: true,
    }
}
