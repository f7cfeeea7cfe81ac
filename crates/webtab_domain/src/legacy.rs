use crate::{Category, HOME_CATEGORY_ID, HOME_CATEGORY_TITLE, Shortcut, default_categories};

pub fn parse_legacy_shortcuts(raw: &str) -> serde_json::Result<Vec<Shortcut>> {
    serde_json::from_str(raw)
}

/// Upgrades the pre-category flat list: it becomes the `home` category and
/// every other default category is appended after it.
pub fn migrate_legacy_shortcuts(shortcuts: Vec<Shortcut>) -> Vec<Category> {
    let mut categories = vec![Category {
        id: HOME_CATEGORY_ID.to_owned(),
        title: HOME_CATEGORY_TITLE.to_owned(),
        shortcuts,
    }];
    categories.extend(default_categories().into_iter().filter(|c| !c.is_home()));
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_list_becomes_home_followed_by_other_defaults() {
        let shortcuts = parse_legacy_shortcuts(
            r##"[{"id":"17","title":"Rust","url":"https://www.rust-lang.org","color":"#b7410e"}]"##,
        )
        .unwrap();

        let categories = migrate_legacy_shortcuts(shortcuts.clone());
        let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["home", "social"]);
        assert_eq!(categories[0].title, "Home");
        assert_eq!(categories[0].shortcuts, shortcuts);
        assert_eq!(categories[1], default_categories()[1]);
    }

    #[test]
    fn empty_legacy_list_still_yields_home() {
        let categories = migrate_legacy_shortcuts(Vec::new());
        assert!(categories[0].is_home());
        assert!(categories[0].shortcuts.is_empty());
    }
}
