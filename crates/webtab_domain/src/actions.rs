use crate::Shortcut;

/// Edits a category collection the way the dashboard does. Ids of new
/// entities are assigned by the caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CollectionAction {
    AddCategory {
        id: String,
        title: String,
    },
    RemoveCategory {
        category_id: String,
    },

    AddShortcut {
        category_id: String,
        shortcut: Shortcut,
    },
    RemoveShortcut {
        category_id: String,
        shortcut_id: String,
    },
    ReorderShortcut {
        category_id: String,
        from_index: usize,
        to_index: usize,
    },
    MoveShortcut {
        shortcut_id: String,
        from_category_id: String,
        to_category_id: String,
    },
}
