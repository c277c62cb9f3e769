//! Named bind-parameter store and placeholder name allocation.

use crate::value::{BindValue, SqlValue};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

/// Ordered map of placeholder name (without the leading `:`) to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    entries: Vec<(String, BindValue)>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<BindValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.insert(name, BindValue::Scalar(value.into()));
    }

    pub fn remove(&mut self, name: &str) -> Option<BindValue> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&BindValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, BindValue)> for ParameterStore {
    fn from_iter<I: IntoIterator<Item = (K, BindValue)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (k, v) in iter {
            store.insert(k, v);
        }
        store
    }
}

impl IntoIterator for ParameterStore {
    type Item = (String, BindValue);
    type IntoIter = std::vec::IntoIter<(String, BindValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ParameterStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Hands out placeholder names that are unique within one parameter store.
///
/// Seeded with the names already bound, so a second compilation into the same
/// store cannot overwrite the first one's values. A free name is returned as
/// requested; a taken one gets a `__2`, `__3` ... suffix.
#[derive(Debug, Clone, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_store(store: &ParameterStore) -> Self {
        Self {
            taken: store.names().map(str::to_string).collect(),
        }
    }

    pub fn claim(&mut self, requested: &str) -> String {
        if self.taken.insert(requested.to_string()) {
            return requested.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{requested}__{n}");
            if self.taken.insert(candidate.clone()) {
                tracing::trace!(requested, allocated = %candidate, "bind name already taken");
                return candidate;
            }
            n += 1;
        }
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_position_on_replace() {
        let mut store = ParameterStore::new();
        store.bind("a", 1);
        store.bind("b", 2);
        store.bind("a", 3);
        let names: Vec<_> = store.names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.get("a"), Some(&BindValue::Scalar(SqlValue::Integer(3))));
    }

    #[test]
    fn serializes_in_insertion_order() {
        let mut store = ParameterStore::new();
        store.bind("z", "last?");
        store.insert("a", vec![SqlValue::from(1), SqlValue::from(2)]);
        assert_eq!(
            serde_json::to_string(&store).unwrap(),
            r#"{"z":"last?","a":[1,2]}"#
        );
    }

    #[test]
    fn allocator_returns_free_names_unchanged() {
        let mut names = NameAllocator::new();
        assert_eq!(names.claim("test1"), "test1");
        assert_eq!(names.claim("test2"), "test2");
    }

    #[test]
    fn allocator_suffixes_taken_names() {
        let mut store = ParameterStore::new();
        store.bind("status", "open");
        let mut names = NameAllocator::for_store(&store);
        assert_eq!(names.claim("status"), "status__2");
        assert_eq!(names.claim("status"), "status__3");
        assert!(names.is_taken("status__2"));
    }
}
