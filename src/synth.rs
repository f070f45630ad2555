//! Virtual page synthesis.
//!
//! After conversion the store only holds real content pages. This module
//! derives the node pages a site needs and appends them to the store, in a
//! fixed order:
//!
//! 1. **Sections** ([`synthesize_sections`]): one listing per distinct
//!    `section` of the real pages, joined to the `main` menu with weights
//!    100, 110, 120… in first-encounter order.
//! 2. **Taxonomies** ([`synthesize_taxonomies`]): one listing per term of each
//!    configured vocabulary (`tags/rust`) plus one index per vocabulary
//!    (`tags`). The index is only added when a layout resolves for it.
//! 3. **Homepage** ([`synthesize_homepage`]): lists the configured homepage
//!    section, unless the content already provides `index`.
//! 4. **Aliases** ([`synthesize_aliases`]): one redirect page per alias,
//!    pointing at the owner's permalink. Runs last so pagination aliases of
//!    the node pages above are covered too.
//!
//! Every insert is guarded by an existence check, so running a phase twice
//! over the same store adds nothing the second time.
//!
//! Member lists are ordered newest first with undated pages last.

use crate::layout::{LayoutResolver, TemplateSource};
use crate::page::{INDEX_MARKER, MAIN_MENU, MenuSpec, NodeType, Page, TaxonomyRef, join_path};
use crate::paginate::{NodeSpec, Pagination, paginate};
use crate::store::{PageStore, StoreError, by_date_desc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

const SECTION_WEIGHT_START: i64 = 100;
const SECTION_WEIGHT_STEP: i64 = 10;
const HOMEPAGE_WEIGHT: i64 = 1;
const HOMEPAGE_TITLE: &str = "Home";

// ============================================================================
// Taxonomy model
// ============================================================================

/// One value within a vocabulary and the pages carrying it.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Display name as first written in front matter.
    pub name: String,
    /// URL segment derived from the name.
    pub slug: String,
    pages: Vec<String>,
}

impl Term {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: term_slug(name),
            pages: Vec::new(),
        }
    }

    /// Tag `page_id` with this term; a page already tagged is left alone.
    pub fn add_page(&mut self, page_id: &str) {
        if !self.pages.iter().any(|p| p == page_id) {
            self.pages.push(page_id.to_string());
        }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }
}

/// A taxonomy dimension (e.g. `tags`) and its terms in first-seen order.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub plural: String,
    pub singular: String,
    terms: Vec<Term>,
    by_slug: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new(plural: impl Into<String>, singular: impl Into<String>) -> Self {
        Self {
            plural: plural.into(),
            singular: singular.into(),
            terms: Vec::new(),
            by_slug: HashMap::new(),
        }
    }

    /// Record that `page_id` carries `term`. Terms whose names differ only in
    /// case or spacing share a slug and therefore a [`Term`].
    pub fn tag(&mut self, term: &str, page_id: &str) {
        let slug = term_slug(term);
        if slug.is_empty() {
            tracing::warn!(
                vocabulary = %self.plural,
                term,
                page = page_id,
                "Skipping term without a usable slug"
            );
            return;
        }
        let pos = match self.by_slug.get(&slug) {
            Some(&pos) => pos,
            None => {
                self.terms.push(Term::new(term));
                self.by_slug.insert(slug, self.terms.len() - 1);
                self.terms.len() - 1
            }
        };
        self.terms[pos].add_page(page_id);
    }

    pub fn get(&self, term: &str) -> Option<&Term> {
        self.by_slug.get(&term_slug(term)).map(|&pos| &self.terms[pos])
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn reference(&self, term: Option<&Term>) -> TaxonomyRef {
        TaxonomyRef {
            plural: self.plural.clone(),
            singular: self.singular.clone(),
            term: term.map(|t| t.name.clone()),
        }
    }
}

/// `"Web Dev"` → `web-dev`. Path separators are dropped.
///
/// A slug made only of dots is empty, and `index` becomes `index-term`: a term
/// page must own its own directory below the vocabulary index.
pub fn term_slug(term: &str) -> String {
    let slug = term
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
        .replace(['/', '\\'], "");
    if slug.chars().all(|c| c == '.') {
        String::new()
    } else if slug == INDEX_MARKER {
        format!("{slug}-term")
    } else {
        slug
    }
}

/// Scan the real pages of `store` for every configured vocabulary.
pub fn collect_vocabularies(
    store: &PageStore,
    taxonomies: &BTreeMap<String, String>,
) -> Vec<Vocabulary> {
    taxonomies
        .iter()
        .map(|(plural, singular)| {
            let mut vocabulary = Vocabulary::new(plural.as_str(), singular.as_str());
            for page in store.iter().filter(|p| !p.is_virtual()) {
                for term in page.variables.terms(plural) {
                    vocabulary.tag(&term, &page.id);
                }
            }
            vocabulary
        })
        .collect()
}

// ============================================================================
// Phases
// ============================================================================

/// Add one section listing per distinct section of the real pages.
///
/// Returns the number of pages added.
pub fn synthesize_sections(
    store: &mut PageStore,
    pagination: &Pagination,
) -> Result<usize, StoreError> {
    let listings: Vec<(String, i64, Vec<String>)> = {
        let mut order: Vec<String> = Vec::new();
        let mut members: HashMap<String, Vec<&Page>> = HashMap::new();
        for page in store.iter().filter(|p| !p.is_virtual()) {
            let Some(section) = page.section.as_deref() else {
                continue;
            };
            let path = join_path(&[section]);
            if path.is_empty() {
                continue;
            }
            members
                .entry(path.clone())
                .or_insert_with(|| {
                    order.push(path);
                    Vec::new()
                })
                .push(page);
        }
        order
            .into_iter()
            .enumerate()
            .map(|(i, path)| {
                let weight = SECTION_WEIGHT_START + SECTION_WEIGHT_STEP * i as i64;
                let ids = newest_first(members.remove(&path).unwrap_or_default());
                (path, weight, ids)
            })
            .collect()
    };

    let mut added = 0;
    for (path, weight, ids) in listings {
        let content_index = join_path(&[path.as_str(), INDEX_MARKER]);
        if store.has(&path) || store.has(&content_index) {
            tracing::debug!(section = %path, "Section page already exists");
            continue;
        }
        let mut spec = NodeSpec::new(path.clone(), NodeType::Section, path.clone());
        spec.section = Some(path);
        let mut pages = paginate(&spec, ids, pagination);
        if let Some(first) = pages.first_mut() {
            first.variables.menu = Some(MenuSpec::weighted(MAIN_MENU, weight));
        }
        added += add_new(store, pages)?;
    }
    Ok(added)
}

/// Add term listings and vocabulary indexes for every configured taxonomy.
///
/// A vocabulary index without a resolvable layout is skipped with a warning;
/// term listings are always added.
pub fn synthesize_taxonomies<T>(
    store: &mut PageStore,
    taxonomies: &BTreeMap<String, String>,
    pagination: &Pagination,
    resolver: &LayoutResolver,
    templates: &T,
) -> Result<usize, StoreError>
where
    T: TemplateSource + ?Sized,
{
    let vocabularies = collect_vocabularies(store, taxonomies);
    let mut added = 0;

    for vocabulary in vocabularies.iter().filter(|v| !v.is_empty()) {
        let base = join_path(&[vocabulary.plural.as_str()]);
        let mut term_ids = Vec::with_capacity(vocabulary.terms().len());

        for term in vocabulary.terms() {
            let path = join_path(&[base.as_str(), term.slug.as_str()]);
            let mut spec = NodeSpec::new(path.clone(), NodeType::Taxonomy, term.name.clone());
            spec.taxonomy = Some(vocabulary.reference(Some(term)));
            spec.extra.insert("count".into(), json!(term.pages().len()));
            let ids = newest_first(term.pages().iter().filter_map(|id| store.get(id)).collect());
            added += add_new(store, paginate(&spec, ids, pagination))?;
            term_ids.push(path);
        }

        if store.has(&base) {
            tracing::debug!(vocabulary = %base, "Taxonomy index already exists");
            continue;
        }
        let mut index = Page::node(base.clone(), NodeType::Terms, vocabulary.plural.clone());
        index.variables.pages = Some(term_ids);
        index.variables.taxonomy = Some(vocabulary.reference(None));
        match resolver.resolve(&index, templates) {
            Ok(_) => {
                store.add(index)?;
                added += 1;
            }
            Err(e) => {
                tracing::warn!(vocabulary = %base, error = %e, "Skipping taxonomy index page");
            }
        }
    }
    Ok(added)
}

/// Add the `index` listing unless the content already provides one.
pub fn synthesize_homepage(
    store: &mut PageStore,
    title: &str,
    section: &str,
    pagination: &Pagination,
) -> Result<usize, StoreError> {
    if store.has(INDEX_MARKER) {
        tracing::debug!("Homepage provided by content");
        return Ok(0);
    }
    let ids = newest_first(
        store
            .iter()
            .filter(|p| !p.is_virtual() && !p.node_type().is_node())
            .filter(|p| p.section.as_deref() == Some(section))
            .collect(),
    );
    let title = if title.is_empty() { HOMEPAGE_TITLE } else { title };
    let spec = NodeSpec::new(INDEX_MARKER, NodeType::Homepage, title);
    let mut pages = paginate(&spec, ids, pagination);
    if let Some(first) = pages.first_mut() {
        first.variables.menu = Some(MenuSpec::weighted(MAIN_MENU, HOMEPAGE_WEIGHT));
    }
    add_new(store, pages)
}

/// Add one redirect page per alias of every page in the store.
///
/// An alias that collides with an existing page (or an earlier alias) is
/// skipped.
pub fn synthesize_aliases(store: &mut PageStore) -> Result<usize, StoreError> {
    let redirects: Vec<Page> = store
        .iter()
        .flat_map(|owner| {
            owner.variables.aliases.iter().filter_map(move |alias| {
                let id = join_path(&[alias.as_str()]);
                (!id.is_empty()).then(|| Page::redirect(id, owner.title.clone(), owner.permalink()))
            })
        })
        .collect();
    add_new(store, redirects)
}

fn newest_first(mut pages: Vec<&Page>) -> Vec<String> {
    pages.sort_by(|a, b| by_date_desc(a, b));
    pages.into_iter().map(|p| p.id.clone()).collect()
}

/// Append the pages whose ids are still free. Returns how many were added.
fn add_new(store: &mut PageStore, pages: Vec<Page>) -> Result<usize, StoreError> {
    let mut added = 0;
    for page in pages {
        if store.has(&page.id) {
            tracing::debug!(id = %page.id, "Page already exists, not synthesizing");
            continue;
        }
        store.add(page)?;
        added += 1;
    }
    Ok(added)
}
