use std::collections::BTreeSet;

use crate::recipe_engine::{normalize_name, ItemKind};

/// Lower-cased names the user owns this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedSets {
    pub beverages: BTreeSet<String>,
    pub ingredients: BTreeSet<String>,
}

/// Scanned/confirmed history of one session.
///
/// Names are stored as received and kept in insertion order for display,
/// duplicates are detected case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    beverages: Vec<String>,
    ingredients: Vec<String>,
}

impl SelectionStore {
    /// Returns `false` when the name (ignoring case) was already present or is blank.
    pub fn add(&mut self, kind: ItemKind, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let normalized = normalize_name(name);
        let entries = self.entries_mut(kind);
        if entries.iter().any(|e| normalize_name(e) == normalized) {
            return false;
        }

        entries.push(name.to_string());
        true
    }

    /// Removes the exact stored value. Absent values are ignored.
    pub fn remove(&mut self, kind: ItemKind, name: &str) -> bool {
        let entries = self.entries_mut(kind);
        match entries.iter().position(|e| e == name) {
            Some(idx) => {
                entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn entries(&self, kind: ItemKind) -> &[String] {
        match kind {
            ItemKind::Beverage => &self.beverages,
            ItemKind::Ingredient => &self.ingredients,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.beverages.is_empty() && self.ingredients.is_empty()
    }

    pub fn snapshot(&self) -> OwnedSets {
        OwnedSets {
            beverages: self.beverages.iter().map(|b| normalize_name(b)).collect(),
            ingredients: self.ingredients.iter().map(|i| normalize_name(i)).collect(),
        }
    }

    fn entries_mut(&mut self, kind: ItemKind) -> &mut Vec<String> {
        match kind {
            ItemKind::Beverage => &mut self.beverages,
            ItemKind::Ingredient => &mut self.ingredients,
        }
    }
}
