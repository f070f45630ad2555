//! Navigation menus.
//!
//! Menus are assembled once, after every page (real and virtual) exists, in
//! two passes:
//!
//! 1. Each page's `menu` variable contributes one [`Entry`] per named menu.
//! 2. `[[site.menu]]` overrides from the config are applied on top: a
//!    `disabled` override removes the entry, any other override replaces the
//!    fields it sets.
//!
//! Entries keep insertion order internally; [`Menu::sorted`] yields them by
//! ascending weight with ties in insertion order.

use crate::config::MenuOverride;
use crate::page::{MenuSpec, Page};
use crate::store::PageStore;
use serde::Serialize;
use std::collections::BTreeMap;

/// Weight of an entry that does not set one.
pub const DEFAULT_WEIGHT: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Page id, or a free-form id for entries created by overrides.
    pub id: String,
    pub name: String,
    pub url: String,
    pub weight: i64,
}

impl Entry {
    fn for_page(page: &Page) -> Self {
        Self {
            id: page.id.clone(),
            name: page.title.clone(),
            url: page.permalink(),
            weight: DEFAULT_WEIGHT,
        }
    }
}

/// One named menu.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menu {
    entries: Vec<Entry>,
}

impl Menu {
    /// Insert `entry`, replacing an entry with the same id in place.
    pub fn upsert(&mut self, entry: Entry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Entry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by ascending weight; equal weights keep insertion order.
    pub fn sorted(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.weight);
        entries
    }
}

/// All menus of a site, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menus {
    menus: BTreeMap<String, Menu>,
}

impl Menus {
    pub fn get(&self, name: &str) -> Option<&Menu> {
        self.menus.get(name)
    }

    pub fn menu_mut(&mut self, name: &str) -> &mut Menu {
        self.menus.entry(name.to_string()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Menu)> {
        self.menus.iter().map(|(name, menu)| (name.as_str(), menu))
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }

    /// Template-facing form: menu name → entries in display order.
    pub fn to_value(&self) -> serde_json::Value {
        let sorted: BTreeMap<&str, Vec<&Entry>> = self
            .iter()
            .map(|(name, menu)| (name, menu.sorted()))
            .collect();
        serde_json::json!(sorted)
    }
}

/// Build every menu from page metadata, then apply `overrides`.
pub fn assemble(store: &PageStore, overrides: &[MenuOverride]) -> Menus {
    let mut menus = Menus::default();

    for page in store {
        match &page.variables.menu {
            None => {}
            Some(MenuSpec::Name(name)) => menus.menu_mut(name).upsert(Entry::for_page(page)),
            Some(MenuSpec::Menus(named)) => {
                for (name, props) in named {
                    let mut entry = Entry::for_page(page);
                    if let Some(weight) = props.weight {
                        entry.weight = weight;
                    }
                    if let Some(label) = &props.name {
                        entry.name = label.clone();
                    }
                    if let Some(url) = &props.url {
                        entry.url = url.clone();
                    }
                    menus.menu_mut(name).upsert(entry);
                }
            }
        }
    }

    for item in overrides {
        if item.disabled {
            if menus.menu_mut(&item.menu).remove(&item.id).is_none() {
                tracing::debug!(menu = %item.menu, id = %item.id, "Disabled menu entry was not present");
            }
            continue;
        }
        let menu = menus.menu_mut(&item.menu);
        let mut entry = menu
            .get(&item.id)
            .cloned()
            .or_else(|| store.get(&item.id).map(Entry::for_page))
            .unwrap_or_else(|| Entry {
                id: item.id.clone(),
                name: item.id.clone(),
                url: String::new(),
                weight: DEFAULT_WEIGHT,
            });
        if let Some(name) = &item.name {
            entry.name = name.clone();
        }
        if let Some(url) = &item.url {
            entry.url = url.clone();
        }
        if let Some(weight) = item.weight {
            entry.weight = weight;
        }
        menu.upsert(entry);
    }

    menus.menus.retain(|_, menu| !menu.is_empty());
    menus
}
