//! The page model shared by every pipeline phase.
//!
//! A [`Page`] is one output-bound document. Real pages come from content
//! files; virtual pages (section listings, taxonomy pages, the homepage,
//! pagination chunks, redirects) are synthesized from them. Both kinds carry
//! the same shape so that layout resolution and rendering never need to know
//! where a page came from.
//!
//! ## Identity and Paths
//!
//! - `id` is the store key and is unique within a [`PageStore`](crate::store::PageStore).
//! - `pathname` is the URL path the page is published under. It starts out
//!   equal to the id but a `permalink` front-matter key may replace it.
//! - The permalink is never stored: [`Page::permalink`] derives it from the
//!   pathname every time, so the two cannot drift apart.
//!
//! ```text
//! pathname            permalink
//! index            →  /
//! blog             →  /blog/
//! blog/index       →  /blog/
//! blog/hello       →  /blog/hello/
//! feed.xml         →  /feed.xml
//! release-1.0      →  /release-1.0/
//! ```
//!
//! ## Variables
//!
//! Front matter and synthesis both attach metadata to a page. The keys the
//! pipeline itself reads (`menu`, `aliases`, `pages`, `paginator`, the
//! taxonomy reference and the redirect destination) are typed fields on
//! [`Variables`]; everything else lands in an open map reachable through
//! [`Variables::get`] and [`Variables::set`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Final path segment that marks a directory index document.
pub const INDEX_MARKER: &str = "index";

/// Layout name that routes a page to the built-in redirect document.
pub const REDIRECT_LAYOUT: &str = "redirect";

/// Menu that synthesized section pages and the homepage join.
pub const MAIN_MENU: &str = "main";

/// What kind of listing a page represents.
///
/// Ordinary content pages (and redirects) are [`NodeType::Page`]; every other
/// variant is a synthesized node page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Page,
    Homepage,
    Section,
    Taxonomy,
    Terms,
}

impl NodeType {
    pub fn is_node(self) -> bool {
        self != NodeType::Page
    }
}

/// Per-menu properties from a `menu:` mapping in front matter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MenuProps {
    pub weight: Option<i64>,
    pub name: Option<String>,
    pub url: Option<String>,
}

/// The `menu` variable: either a single menu name or a map of menu name to
/// properties.
///
/// ```yaml
/// menu: main
/// # or
/// menu:
///   main: { weight: 20 }
///   footer: { weight: 5, name: "Contact us" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MenuSpec {
    Name(String),
    Menus(BTreeMap<String, MenuProps>),
}

impl MenuSpec {
    /// A single-menu spec with an explicit weight.
    pub fn weighted(menu: &str, weight: i64) -> Self {
        let props = MenuProps {
            weight: Some(weight),
            ..MenuProps::default()
        };
        MenuSpec::Menus(BTreeMap::from([(menu.to_string(), props)]))
    }
}

/// Position of one chunk within a paginated listing.
///
/// `prev` and `next` are permalinks of the adjacent chunks and are absent at
/// the first and last chunk respectively.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginator {
    /// Member page ids of this chunk, in listing order.
    pub pages: Vec<String>,
    /// 1-based chunk number.
    pub number: usize,
    pub total: usize,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Which vocabulary (and optionally which term) a taxonomy node belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyRef {
    pub plural: String,
    pub singular: String,
    /// Term display name; `None` on the vocabulary index page.
    pub term: Option<String>,
}

/// Metadata attached to a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    pub menu: Option<MenuSpec>,
    pub aliases: Vec<String>,
    /// Member page ids of a node page.
    pub pages: Option<Vec<String>>,
    pub paginator: Option<Paginator>,
    pub taxonomy: Option<TaxonomyRef>,
    /// Redirect target permalink.
    pub destination: Option<String>,
    extra: BTreeMap<String, Value>,
}

impl Variables {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.extra.insert(key.into(), value);
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    /// Terms listed under a taxonomy key, normalized to a list.
    ///
    /// A single string becomes a one-element list; numbers and booleans are
    /// stringified; blank and structured values are ignored.
    pub fn terms(&self, plural: &str) -> Vec<String> {
        match self.extra.get(plural) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_to_term).collect(),
            Some(value) => scalar_to_term(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self.extra.get("draft"), Some(Value::Bool(true)))
    }
}

fn scalar_to_term(value: &Value) -> Option<String> {
    let term = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!term.is_empty()).then_some(term)
}

/// One output-bound document.
///
/// Node type and virtual flag are private so that the invariant "a node page
/// is always virtual" holds by construction: content pages come from
/// [`Page::new`], node pages from [`Page::node`], redirects from
/// [`Page::redirect`].
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: String,
    pub pathname: String,
    pub title: String,
    pub section: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub layout: Option<String>,
    pub html: String,
    pub variables: Variables,
    node_type: NodeType,
    is_virtual: bool,
}

impl Page {
    /// A real content page whose pathname starts out equal to its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            pathname: id.clone(),
            title: String::new(),
            section: None,
            date: None,
            layout: None,
            html: String::new(),
            variables: Variables::default(),
            node_type: NodeType::Page,
            is_virtual: false,
            id,
        }
    }

    /// A synthesized listing page.
    pub fn node(id: impl Into<String>, node_type: NodeType, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            node_type,
            is_virtual: true,
            ..Self::new(id)
        }
    }

    /// A synthesized page that redirects to `destination`.
    pub fn redirect(
        id: impl Into<String>,
        title: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        let mut page = Self {
            title: title.into(),
            layout: Some(REDIRECT_LAYOUT.to_string()),
            is_virtual: true,
            ..Self::new(id)
        };
        page.variables.destination = Some(destination.into());
        page
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    pub fn is_redirect(&self) -> bool {
        self.layout.as_deref() == Some(REDIRECT_LAYOUT)
    }

    pub fn permalink(&self) -> String {
        permalink_for(&self.pathname)
    }

    /// Member page ids of a node page (the current chunk when paginated).
    pub fn members(&self) -> &[String] {
        self.variables.pages.as_deref().unwrap_or_default()
    }
}

/// Split a pathname into its non-empty segments, dropping `.` and `..` so a
/// pathname can never climb out of the output root.
pub fn path_segments(pathname: &str) -> Vec<&str> {
    pathname
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect()
}

/// Join path pieces with single separators, skipping empty pieces.
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| path_segments(p))
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive the public URL path of a pathname.
pub fn permalink_for(pathname: &str) -> String {
    let segments = path_segments(pathname);
    match segments.split_last() {
        None => "/".to_string(),
        Some((last, rest)) if *last == INDEX_MARKER => {
            if rest.is_empty() {
                "/".to_string()
            } else {
                format!("/{}/", rest.join("/"))
            }
        }
        Some((last, _)) if has_extension(last) => format!("/{}", segments.join("/")),
        Some(_) => format!("/{}/", segments.join("/")),
    }
}

/// Whether the last dot of `segment` starts a file type (`xml`, `json`).
/// Version numbers such as `release-1.0` do not count.
pub(crate) fn has_extension(segment: &str) -> bool {
    Path::new(segment)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ext.starts_with(|c: char| c.is_ascii_alphabetic())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
}
