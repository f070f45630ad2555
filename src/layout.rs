//! Layout resolution: page → template.
//!
//! Every page maps to an ordered list of candidate template names, most
//! specific first. The cascade depends on the page's [`NodeType`]:
//!
//! | Node type | Candidates |
//! |-----------|------------|
//! | Homepage  | `index.html`, `_default/list.html`, `_default/page.html` |
//! | Section   | `section/<section>.html`, `_default/section.html`, `_default/list.html` |
//! | Taxonomy  | `taxonomy/<singular>.html`, `_default/taxonomy.html`, `_default/list.html` |
//! | Terms     | `taxonomy/<singular>.terms.html`, `_default/terms.html` |
//! | Page      | `<section>/<layout>.html`, `<section>/page.html`, `<layout>.html`, `page.html`, `_default/page.html` |
//!
//! Candidates that need an unknown section, layout or vocabulary are left
//! out. A page whose layout is the redirect marker bypasses the cascade.
//!
//! Resolution probes the site's layout directory first, then the theme's,
//! each in candidate order. The first template that exists wins.

use crate::page::{NodeType, Page};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LayoutError {
    #[error("no layout found for page `{page}` (tried: {})", candidates.join(", "))]
    NotFound {
        page: String,
        candidates: Vec<String>,
    },
}

/// Answers whether a template id exists. Implemented by renderers.
pub trait TemplateSource {
    fn exists(&self, template: &str) -> bool;
}

/// Outcome of resolving a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// A template id, including its layout directory prefix.
    Template(String),
    /// The built-in redirect document.
    Redirect,
}

const LIST_DEFAULT: &str = "_default/list.html";
const PAGE_DEFAULT: &str = "_default/page.html";
const SECTION_DEFAULT: &str = "_default/section.html";
const TAXONOMY_DEFAULT: &str = "_default/taxonomy.html";
const TERMS_DEFAULT: &str = "_default/terms.html";

/// Ordered layout directories to probe.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResolver {
    dirs: Vec<String>,
}

impl LayoutResolver {
    /// `site_dir` is searched before `theme_dir`. Both are template-id
    /// prefixes (e.g. `layouts`, `themes/paper/layouts`).
    pub fn new(site_dir: impl Into<String>, theme_dir: Option<String>) -> Self {
        let mut dirs = vec![site_dir.into()];
        dirs.extend(theme_dir);
        Self { dirs }
    }

    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }

    /// Candidate template names for `page`, most specific first.
    pub fn candidates(page: &Page) -> Vec<String> {
        let singular = page
            .variables
            .taxonomy
            .as_ref()
            .map(|t| t.singular.as_str());
        match page.node_type() {
            NodeType::Homepage => homepage_candidates(),
            NodeType::Section => section_candidates(page.section.as_deref()),
            NodeType::Taxonomy => taxonomy_candidates(singular),
            NodeType::Terms => terms_candidates(singular),
            NodeType::Page => page_candidates(page.section.as_deref(), page.layout.as_deref()),
        }
    }

    /// Pick the first existing template for `page`.
    pub fn resolve<T>(&self, page: &Page, source: &T) -> Result<Layout, LayoutError>
    where
        T: TemplateSource + ?Sized,
    {
        if page.is_redirect() {
            return Ok(Layout::Redirect);
        }
        let candidates = Self::candidates(page);
        let mut tried = Vec::with_capacity(candidates.len() * self.dirs.len());
        for dir in &self.dirs {
            for name in &candidates {
                let template = format!("{}/{}", dir.trim_end_matches('/'), name);
                if source.exists(&template) {
                    return Ok(Layout::Template(template));
                }
                tried.push(template);
            }
        }
        Err(LayoutError::NotFound {
            page: page.id.clone(),
            candidates: tried,
        })
    }
}

fn homepage_candidates() -> Vec<String> {
    vec![
        "index.html".to_string(),
        LIST_DEFAULT.to_string(),
        PAGE_DEFAULT.to_string(),
    ]
}

fn section_candidates(section: Option<&str>) -> Vec<String> {
    section
        .map(|s| format!("section/{s}.html"))
        .into_iter()
        .chain([SECTION_DEFAULT.to_string(), LIST_DEFAULT.to_string()])
        .collect()
}

fn taxonomy_candidates(singular: Option<&str>) -> Vec<String> {
    singular
        .map(|s| format!("taxonomy/{s}.html"))
        .into_iter()
        .chain([TAXONOMY_DEFAULT.to_string(), LIST_DEFAULT.to_string()])
        .collect()
}

fn terms_candidates(singular: Option<&str>) -> Vec<String> {
    singular
        .map(|s| format!("taxonomy/{s}.terms.html"))
        .into_iter()
        .chain([TERMS_DEFAULT.to_string()])
        .collect()
}

fn page_candidates(section: Option<&str>, layout: Option<&str>) -> Vec<String> {
    let layout = layout.map(|l| l.strip_suffix(".html").unwrap_or(l));
    let mut candidates = Vec::new();
    if let Some(section) = section {
        if let Some(layout) = layout {
            candidates.push(format!("{section}/{layout}.html"));
        }
        candidates.push(format!("{section}/page.html"));
    }
    if let Some(layout) = layout {
        candidates.push(format!("{layout}.html"));
    }
    candidates.push("page.html".to_string());
    candidates.push(PAGE_DEFAULT.to_string());
    candidates
}
