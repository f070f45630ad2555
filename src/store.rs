//! Ordered, id-keyed page collection.
//!
//! Iteration follows insertion order. Lookups go through a side index so
//! `has`/`get` stay O(1) regardless of store size. Derived views
//! ([`PageStore::filter`], [`PageStore::sorted_by`]) return new stores and
//! leave the source untouched.

use crate::page::Page;
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("a page with id `{0}` already exists")]
    DuplicateId(String),
    #[error("no page with id `{0}`")]
    NotFound(String),
}

#[derive(Debug, Clone, Default)]
pub struct PageStore {
    pages: Vec<Page>,
    index: HashMap<String, usize>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Append a page. Fails if its id is already taken.
    pub fn add(&mut self, page: Page) -> Result<(), StoreError> {
        if self.index.contains_key(&page.id) {
            return Err(StoreError::DuplicateId(page.id));
        }
        self.index.insert(page.id.clone(), self.pages.len());
        self.pages.push(page);
        Ok(())
    }

    /// Append several pages, stopping at the first duplicate.
    pub fn add_all(&mut self, pages: impl IntoIterator<Item = Page>) -> Result<(), StoreError> {
        pages.into_iter().try_for_each(|page| self.add(page))
    }

    /// Swap the page stored under `id` for `page`, keeping its position.
    ///
    /// The replacement may carry a different id as long as that id is free.
    /// Returns the page that was replaced.
    pub fn replace(&mut self, id: &str, page: Page) -> Result<Page, StoreError> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if page.id != id {
            if self.index.contains_key(&page.id) {
                return Err(StoreError::DuplicateId(page.id));
            }
            self.index.remove(id);
            self.index.insert(page.id.clone(), pos);
        }
        Ok(std::mem::replace(&mut self.pages[pos], page))
    }

    pub fn has(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Page> {
        self.index.get(id).map(|&pos| &self.pages[pos])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }

    pub fn as_slice(&self) -> &[Page] {
        &self.pages
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|p| p.id.as_str())
    }

    /// A new store holding the matching pages in their original order.
    pub fn filter(&self, predicate: impl Fn(&Page) -> bool) -> PageStore {
        self.rebuilt(self.pages.iter().filter(|&p| predicate(p)).cloned().collect())
    }

    /// A new store ordered by `compare`. The sort is stable: pages that compare
    /// equal keep their relative order.
    pub fn sorted_by(&self, compare: impl FnMut(&Page, &Page) -> Ordering) -> PageStore {
        let mut pages = self.pages.clone();
        pages.sort_by(compare);
        self.rebuilt(pages)
    }

    fn rebuilt(&self, pages: Vec<Page>) -> PageStore {
        let index = pages
            .iter()
            .enumerate()
            .map(|(pos, p)| (p.id.clone(), pos))
            .collect();
        PageStore { pages, index }
    }
}

impl<'a> IntoIterator for &'a PageStore {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

/// Newest first; undated pages sort after dated ones.
pub fn by_date_desc(a: &Page, b: &Page) -> Ordering {
    match (&a.date, &b.date) {
        (Some(da), Some(db)) => db.cmp(da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
