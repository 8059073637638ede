//! Named libraries of reusable items (styles, groups).

use super::LibraryId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, ordered item sequence with one selected item.
///
/// `selected` is always `None` or a member of `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library<T> {
    pub(crate) id: LibraryId,
    pub name: String,
    pub items: Vec<T>,
    #[serde(default)]
    pub(crate) selected: Option<T>,
}

impl<T: Copy + PartialEq> Library<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            items: Vec::new(),
            selected: None,
        }
    }

    pub fn id(&self) -> LibraryId {
        self.id
    }

    pub fn selected(&self) -> Option<T> {
        self.selected
    }

    /// Select an item. Returns false if the item is not a member.
    pub fn set_selected(&mut self, item: Option<T>) -> bool {
        match item {
            Some(value) if !self.items.contains(&value) => false,
            _ => {
                self.selected = item;
                true
            }
        }
    }

    /// Replace the items, re-pointing `selected` at the first item if it left the library.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        if let Some(selected) = self.selected {
            if !self.items.contains(&selected) {
                self.selected = self.items.first().copied();
            }
        }
        if self.selected.is_none() {
            self.selected = self.items.first().copied();
        }
    }
}
