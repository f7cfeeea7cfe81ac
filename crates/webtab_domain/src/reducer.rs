use crate::{Category, CollectionAction};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CollectionError {
    HomeCategoryProtected,
    DuplicateCategoryId(String),
    CategoryNotFound(String),
    DuplicateShortcutId(String),
    ShortcutNotFound(String),
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionError::HomeCategoryProtected => {
                write!(f, "the home category cannot be removed")
            }
            CollectionError::DuplicateCategoryId(id) => {
                write!(f, "category id already exists: {id}")
            }
            CollectionError::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            CollectionError::DuplicateShortcutId(id) => {
                write!(f, "shortcut id already exists: {id}")
            }
            CollectionError::ShortcutNotFound(id) => write!(f, "shortcut not found: {id}"),
            CollectionError::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for {len} shortcuts")
            }
        }
    }
}

impl std::error::Error for CollectionError {}

fn category_index(categories: &[Category], id: &str) -> Result<usize, CollectionError> {
    categories
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| CollectionError::CategoryNotFound(id.to_owned()))
}

/// Applies `action` in place. On error the collection is left unchanged.
pub fn apply_collection_action(
    categories: &mut Vec<Category>,
    action: CollectionAction,
) -> Result<(), CollectionError> {
    match action {
        CollectionAction::AddCategory { id, title } => {
            if categories.iter().any(|c| c.id == id) {
                return Err(CollectionError::DuplicateCategoryId(id));
            }
            categories.push(Category {
                id,
                title,
                shortcuts: Vec::new(),
            });
        }
        CollectionAction::RemoveCategory { category_id } => {
            let idx = category_index(categories, &category_id)?;
            if categories[idx].is_home() {
                return Err(CollectionError::HomeCategoryProtected);
            }
            categories.remove(idx);
        }
        CollectionAction::AddShortcut {
            category_id,
            shortcut,
        } => {
            let idx = category_index(categories, &category_id)?;
            let category = &mut categories[idx];
            if category.shortcuts.iter().any(|s| s.id == shortcut.id) {
                return Err(CollectionError::DuplicateShortcutId(shortcut.id));
            }
            category.shortcuts.push(shortcut);
        }
        CollectionAction::RemoveShortcut {
            category_id,
            shortcut_id,
        } => {
            let idx = category_index(categories, &category_id)?;
            let shortcuts = &mut categories[idx].shortcuts;
            let pos = shortcuts
                .iter()
                .position(|s| s.id == shortcut_id)
                .ok_or(CollectionError::ShortcutNotFound(shortcut_id))?;
            shortcuts.remove(pos);
        }
        CollectionAction::ReorderShortcut {
            category_id,
            from_index,
            to_index,
        } => {
            let idx = category_index(categories, &category_id)?;
            let shortcuts = &mut categories[idx].shortcuts;
            let len = shortcuts.len();
            for index in [from_index, to_index] {
                if index >= len {
                    return Err(CollectionError::IndexOutOfRange { index, len });
                }
            }
            let moved = shortcuts.remove(from_index);
            shortcuts.insert(to_index, moved);
        }
        CollectionAction::MoveShortcut {
            shortcut_id,
            from_category_id,
            to_category_id,
        } => {
            let from = category_index(categories, &from_category_id)?;
            let to = category_index(categories, &to_category_id)?;
            if from == to {
                return Ok(());
            }
            let pos = categories[from]
                .shortcuts
                .iter()
                .position(|s| s.id == shortcut_id)
                .ok_or_else(|| CollectionError::ShortcutNotFound(shortcut_id.clone()))?;
            if categories[to].shortcuts.iter().any(|s| s.id == shortcut_id) {
                return Err(CollectionError::DuplicateShortcutId(shortcut_id));
            }
            let shortcut = categories[from].shortcuts.remove(pos);
            categories[to].shortcuts.push(shortcut);
        }
    }
    Ok(())
}
