//! Shared test utilities for the plinth test suite.
//!
//! Provides page and store builders, lookup helpers that panic with the
//! available ids on a miss, and an in-memory template set standing in for the
//! real renderer.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let store = store_of(vec![
//!     dated_page("blog/new", Some("blog"), Some("2024-01-01")),
//!     dated_page("about", None, None),
//! ]);
//! assert_eq!(ids(&store), vec!["blog/new", "about"]);
//!
//! let templates = FakeTemplates::with(&["layouts/_default/page.html"]);
//! assert!(templates.exists("layouts/_default/page.html"));
//! ```

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::convert::parse_date;
use crate::layout::TemplateSource;
use crate::page::Page;
use crate::render::{RenderError, Renderer};
use crate::store::PageStore;

// =========================================================================
// Builders
// =========================================================================

/// A real page with an optional section and `YYYY-MM-DD` date.
pub fn dated_page(id: &str, section: Option<&str>, date: Option<&str>) -> Page {
    let mut page = Page::new(id);
    page.section = section.map(String::from);
    page.date = date.map(|d| parse_date(d).unwrap_or_else(|| panic!("bad test date '{d}'")));
    page
}

/// A store holding `pages` in order. Panics on duplicate ids.
pub fn store_of(pages: Vec<Page>) -> PageStore {
    let mut store = PageStore::new();
    store.add_all(pages).unwrap();
    store
}

// =========================================================================
// Lookups (panic with the available ids on a miss)
// =========================================================================

/// Find a page by id. Panics if not found.
pub fn find_page<'a>(store: &'a PageStore, id: &str) -> &'a Page {
    store.get(id).unwrap_or_else(|| {
        let available = ids(store);
        panic!("page '{id}' not found. Available: {available:?}")
    })
}

/// All page ids in store order.
pub fn ids(store: &PageStore) -> Vec<&str> {
    store.ids().collect()
}

// =========================================================================
// Fake renderer
// =========================================================================

/// A fixed set of template ids.
///
/// Rendering an existing template yields `"<template>|<page id>|<page title>"`
/// so tests can check which layout a page went through. Globals are kept for
/// inspection.
#[derive(Debug, Default)]
pub struct FakeTemplates {
    templates: HashSet<String>,
    pub globals: BTreeMap<String, Value>,
}

impl FakeTemplates {
    pub fn with(templates: &[&str]) -> Self {
        Self {
            templates: templates.iter().map(|t| t.to_string()).collect(),
            globals: BTreeMap::new(),
        }
    }
}

impl TemplateSource for FakeTemplates {
    fn exists(&self, template: &str) -> bool {
        self.templates.contains(template)
    }
}

impl Renderer for FakeTemplates {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        if !self.exists(template) {
            return Err(RenderError::Template {
                template: template.to_string(),
                message: "template not found".into(),
            });
        }
        let page = &context["page"];
        Ok(format!(
            "{template}|{}|{}",
            page["id"].as_str().unwrap_or_default(),
            page["title"].as_str().unwrap_or_default()
        ))
    }

    fn add_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }
}
