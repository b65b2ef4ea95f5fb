use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::entry::{Entry, Placement};

/// Ordered, uniquely named modules of a single page
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PageModules {
    entries: Vec<Entry>,
}

impl PageModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Compute where a module goes relative to `marker`
    pub fn resolve_marker(&self, marker: &str, placement: Placement) -> Option<usize> {
        self.position(marker).map(|index| match placement {
            Placement::Before => index,
            Placement::After => index + 1,
        })
    }

    /// Append unless the name is taken; returns false on collision
    pub(crate) fn push(&mut self, entry: Entry) -> bool {
        if self.contains(&entry.name) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Stable positional insert; returns false on collision
    pub(crate) fn insert(&mut self, index: usize, entry: Entry) -> bool {
        if self.contains(&entry.name) {
            return false;
        }
        self.entries.insert(index.min(self.entries.len()), entry);
        true
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Entry> {
        self.position(name).map(|index| self.entries.remove(index))
    }

    /// Rename `target` in place and attribute it to `source`
    pub(crate) fn rename(&mut self, target: &str, replacement: &str, source: &str) -> bool {
        match self.entries.iter_mut().find(|entry| entry.name == target) {
            Some(entry) => {
                entry.name = replacement.to_string();
                entry.source = source.to_string();
                true
            }
            None => false,
        }
    }
}

impl FromIterator<Entry> for PageModules {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut modules = PageModules::new();
        for entry in iter {
            modules.push(entry);
        }
        modules
    }
}

/// Page id to ordered module list, pages kept in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PageTable {
    pages: IndexMap<String, PageModules>,
}

impl PageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Modules for `page`, empty when the page is unknown
    pub fn get_for_page(&self, page: &str) -> &[Entry] {
        self.pages
            .get(page)
            .map(PageModules::entries)
            .unwrap_or_default()
    }

    pub fn page(&self, page: &str) -> Option<&PageModules> {
        self.pages.get(page)
    }

    pub fn contains_page(&self, page: &str) -> bool {
        self.pages.contains_key(page)
    }

    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PageModules)> {
        self.pages.iter().map(|(page, modules)| (page.as_str(), modules))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub(crate) fn page_mut(&mut self, page: &str) -> Option<&mut PageModules> {
        self.pages.get_mut(page)
    }

    pub(crate) fn page_or_create(&mut self, page: &str) -> &mut PageModules {
        self.pages.entry(page.to_string()).or_default()
    }

    pub(crate) fn pages_mut(&mut self) -> impl Iterator<Item = (&str, &mut PageModules)> {
        self.pages
            .iter_mut()
            .map(|(page, modules)| (page.as_str(), modules))
    }
}

impl FromIterator<(String, PageModules)> for PageTable {
    fn from_iter<I: IntoIterator<Item = (String, PageModules)>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}
