//! Id-keyed registry
//!
//! Dense backing store plus an id -> index map. Iteration follows insertion
//! order, which the visual engine relies on for draw order. Replacing an
//! existing id keeps its slot.

use std::collections::HashMap;

/// Insertion-ordered map from stable string ids to owned entries
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Registry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or replace the entry for `id`, returning the previous entry
    pub fn insert(&mut self, id: impl Into<String>, value: T) -> Option<T> {
        let id = id.into();
        match self.index.get(&id) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, value)),
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, value));
                None
            }
        }
    }

    /// Remove the entry for `id`
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let slot = self.index.remove(id)?;
        let (_, value) = self.entries.remove(slot);
        for (_, position) in self.index.iter_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(value)
    }

    /// Borrow the entry for `id`
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&slot| &self.entries[slot].1)
    }

    /// Mutably borrow the entry for `id`
    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        let slot = *self.index.get(id)?;
        Some(&mut self.entries[slot].1)
    }

    /// Check whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Remove every entry, yielding them in insertion order
    pub fn drain(&mut self) -> impl Iterator<Item = (String, T)> + '_ {
        self.index.clear();
        self.entries.drain(..)
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }

    /// Mutable entries in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries
            .iter_mut()
            .map(|(id, value)| (id.as_str(), value))
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Mutable values in insertion order
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().map(|(_, value)| value)
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut registry = Registry::new();
        assert!(registry.insert("a", 1).is_none());
        assert!(registry.insert("b", 2).is_none());
        assert_eq!(registry.get("a"), Some(&1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_replace_keeps_slot() {
        let mut registry = Registry::new();
        registry.insert("a", 1);
        registry.insert("b", 2);
        assert_eq!(registry.insert("a", 10), Some(1));

        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(registry.get("a"), Some(&10));
    }

    #[test]
    fn test_remove_preserves_order_and_lookup() {
        let mut registry = Registry::new();
        registry.insert("a", 1);
        registry.insert("b", 2);
        registry.insert("c", 3);

        assert_eq!(registry.remove("a"), Some(1));
        assert_eq!(registry.get("b"), Some(&2));
        assert_eq!(registry.get("c"), Some(&3));
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec!["b", "c"]);

        assert_eq!(registry.remove("missing"), None);
    }

    #[test]
    fn test_drain_empties() {
        let mut registry = Registry::new();
        registry.insert("a", 1);
        registry.insert("b", 2);

        let drained: Vec<(String, i32)> = registry.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
        assert!(!registry.contains("a"));
    }
}
