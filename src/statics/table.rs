//! Case-insensitive lookup table that remembers registration order.

use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct Table<T> {
    index: BTreeMap<String, usize>,
    entries: Vec<Arc<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            index: BTreeMap::new(),
            entries: Vec::new(),
        }
    }
}

pub(crate) fn fold(name: &str) -> String {
    name.to_lowercase()
}

impl<T> Table<T> {
    pub(crate) fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.index.get(&fold(name)).map(|&idx| &self.entries[idx])
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&fold(name))
    }

    /// Caller checks for clashes first; a clashing insert replaces the lookup
    /// key but keeps the old entry in the enumeration.
    pub(crate) fn insert(&mut self, name: &str, entry: Arc<T>) {
        self.index.insert(fold(name), self.entries.len());
        self.entries.push(entry);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
