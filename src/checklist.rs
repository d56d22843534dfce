//! Per-item "acquired" state for the current shopping list.
//!
//! The state belongs to one interactive session and is never persisted.
//! Loading a list replaces whatever was there; toggling a pair the list does
//! not contain does nothing, since a UI may still hold a reference to an
//! item from a list that has since been replaced.

use crate::output::ShoppingList;
use serde::Serialize;
use std::collections::BTreeMap;

/// One checkable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistEntry<'a> {
    pub category: &'a str,
    pub item: &'a str,
    pub acquired: bool,
}

/// Checklist derived from the current [`ShoppingList`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistState {
    list: Option<ShoppingList>,
    acquired: BTreeMap<(String, String), bool>,
}

impl ChecklistState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all state with `list`; every item starts unacquired.
    ///
    /// A free-text list is stored for display but yields no entries.
    pub fn load(&mut self, list: ShoppingList) {
        self.acquired.clear();
        if let ShoppingList::Categorized(ref categories) = list {
            for (category, items) in categories {
                for item in items {
                    self.acquired.insert((category.clone(), item.clone()), false);
                }
            }
        }
        self.list = Some(list);
    }

    /// Flip the acquired flag for `(category, item)`.
    ///
    /// Returns the new state, or `None` if the pair is unknown.
    pub fn toggle(&mut self, category: &str, item: &str) -> Option<bool> {
        let flag = self
            .acquired
            .get_mut(&(category.to_string(), item.to_string()))?;
        *flag = !*flag;
        Some(*flag)
    }

    /// Discard the list and all entries.
    pub fn clear(&mut self) {
        self.list = None;
        self.acquired.clear();
    }

    /// The loaded list, if any.
    pub fn list(&self) -> Option<&ShoppingList> {
        self.list.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.list.is_some()
    }

    pub fn is_checklist_capable(&self) -> bool {
        self.list
            .as_ref()
            .is_some_and(ShoppingList::is_checklist_capable)
    }

    /// Acquired flag for a pair; `None` if unknown.
    pub fn is_acquired(&self, category: &str, item: &str) -> Option<bool> {
        self.acquired
            .get(&(category.to_string(), item.to_string()))
            .copied()
    }

    /// Entries in list order: categories as stored, items as the provider
    /// listed them.
    pub fn entries(&self) -> Vec<ChecklistEntry<'_>> {
        let Some(ShoppingList::Categorized(categories)) = &self.list else {
            return Vec::new();
        };

        let mut entries = Vec::with_capacity(self.acquired.len());
        for (category, items) in categories {
            for item in items {
                entries.push(ChecklistEntry {
                    category,
                    item,
                    acquired: self
                        .is_acquired(category, item)
                        .unwrap_or(false),
                });
            }
        }
        entries
    }

    pub fn acquired_count(&self) -> usize {
        self.acquired.values().filter(|&&a| a).count()
    }

    /// Number of distinct checkable pairs.
    pub fn total_count(&self) -> usize {
        self.acquired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> ShoppingList {
        ShoppingList::categorized(vec![
            ("Dairy".to_string(), vec!["Milk".to_string(), "Eggs".to_string()]),
            ("Produce".to_string(), vec!["Spinach".to_string()]),
        ])
    }

    #[test]
    fn load_starts_unacquired() {
        let mut state = ChecklistState::new();
        state.load(list());
        assert_eq!(state.total_count(), 3);
        assert_eq!(state.acquired_count(), 0);
        assert_eq!(state.is_acquired("Dairy", "Milk"), Some(false));
        assert!(state.is_checklist_capable());
    }

    #[test]
    fn double_toggle_restores_state() {
        let mut state = ChecklistState::new();
        state.load(list());
        let before = state.clone();
        assert_eq!(state.toggle("Dairy", "Eggs"), Some(true));
        assert_eq!(state.acquired_count(), 1);
        assert_eq!(state.toggle("Dairy", "Eggs"), Some(false));
        assert_eq!(state, before);
    }

    #[test]
    fn toggle_unknown_pair_is_noop() {
        let mut state = ChecklistState::new();
        state.load(list());
        let before = state.clone();
        assert_eq!(state.toggle("Dairy", "Butter"), None);
        assert_eq!(state.toggle("Bakery", "Milk"), None);
        assert_eq!(state, before);

        let mut empty = ChecklistState::new();
        assert_eq!(empty.toggle("Dairy", "Milk"), None);
    }

    #[test]
    fn load_replaces_without_merging() {
        let mut state = ChecklistState::new();
        state.load(list());
        state.toggle("Dairy", "Milk");

        let other = ShoppingList::categorized(vec![("Bakery".to_string(), vec!["Rye bread".to_string()])]);
        state.load(other.clone());
        assert_eq!(state.total_count(), 1);
        assert_eq!(state.is_acquired("Dairy", "Milk"), None);
        assert_eq!(state.list(), Some(&other));
    }

    #[test]
    fn clear_then_load_equals_fresh_load() {
        let mut used = ChecklistState::new();
        used.load(list());
        used.toggle("Produce", "Spinach");
        used.clear();
        assert!(!used.is_loaded());
        assert_eq!(used.total_count(), 0);
        used.load(list());

        let mut fresh = ChecklistState::new();
        fresh.load(list());
        assert_eq!(used, fresh);
    }

    #[test]
    fn free_text_is_display_only() {
        let mut state = ChecklistState::new();
        state.load(ShoppingList::FreeText("- milk\n- eggs".into()));
        assert!(state.is_loaded());
        assert!(!state.is_checklist_capable());
        assert!(state.entries().is_empty());
        assert_eq!(state.toggle("Shopping list", "- milk\n- eggs"), None);
    }

    #[test]
    fn repeated_item_is_one_row() {
        let mut state = ChecklistState::new();
        state.load(ShoppingList::categorized(vec![(
            "Dairy".to_string(),
            vec!["Milk".to_string(), "Milk".to_string(), "Eggs".to_string()],
        )]));
        let list_items = state.list().map(ShoppingList::item_count);
        assert_eq!(list_items, Some(2));
        assert_eq!(state.entries().len(), state.total_count());

        state.toggle("Dairy", "Milk");
        let acquired: Vec<bool> = state.entries().iter().map(|e| e.acquired).collect();
        assert_eq!(acquired, vec![true, false]);
    }

    #[test]
    fn entries_follow_list_order() {
        let mut state = ChecklistState::new();
        state.load(list());
        state.toggle("Produce", "Spinach");
        let entries = state.entries();
        let rows: Vec<(&str, &str, bool)> = entries
            .iter()
            .map(|e| (e.category, e.item, e.acquired))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Dairy", "Milk", false),
                ("Dairy", "Eggs", false),
                ("Produce", "Spinach", true),
            ]
        );
    }

    #[test]
    fn entries_keep_department_order() {
        let mut state = ChecklistState::new();
        state.load(ShoppingList::categorized(vec![
            ("Produce".to_string(), vec!["Kale".to_string()]),
            ("Meat".to_string(), vec!["Chicken".to_string()]),
            ("Dairy".to_string(), vec!["Milk".to_string()]),
        ]));
        let categories: Vec<&str> = state.entries().iter().map(|e| e.category).collect();
        assert_eq!(categories, vec!["Produce", "Meat", "Dairy"]);
    }
}
