//! Pagination of node listings.
//!
//! A node page (section, taxonomy term, homepage) lists member pages. When
//! the list is longer than `site.paginate.max`, it is split into a chain of
//! chunk pages:
//!
//! ```text
//! blog            chunk 1  (alias: blog/page/1)
//! blog/page/2     chunk 2
//! blog/page/3     chunk 3
//! ```
//!
//! For an index path the chunks hang off its directory instead
//! (`index` → `page/2`, `docs/index` → `docs/page/2`).

use crate::config::PaginateConfig;
use crate::page::{
    INDEX_MARKER, NodeType, Page, Paginator, TaxonomyRef, join_path, path_segments, permalink_for,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Pagination settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    /// Members per chunk; 0 disables pagination.
    pub max: usize,
    /// Segment between the listing path and the chunk number.
    pub segment: String,
}

impl Pagination {
    pub fn disabled() -> Self {
        Self {
            max: 0,
            segment: "page".to_string(),
        }
    }
}

impl From<&PaginateConfig> for Pagination {
    fn from(config: &PaginateConfig) -> Self {
        Self {
            max: config.max,
            segment: config.path.clone(),
        }
    }
}

/// Everything the chunks of one listing share.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub path: String,
    pub title: String,
    pub node_type: NodeType,
    pub section: Option<String>,
    pub taxonomy: Option<TaxonomyRef>,
    pub extra: BTreeMap<String, Value>,
}

impl NodeSpec {
    pub fn new(path: impl Into<String>, node_type: NodeType, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            node_type,
            section: None,
            taxonomy: None,
            extra: BTreeMap::new(),
        }
    }

    fn page(&self, id: String, members: Vec<String>) -> Page {
        let mut page = Page::node(id, self.node_type, self.title.clone());
        page.section = self.section.clone();
        page.variables.pages = Some(members);
        page.variables.taxonomy = self.taxonomy.clone();
        for (key, value) in &self.extra {
            page.variables.set(key.clone(), value.clone());
        }
        page
    }
}

/// Produce the node page(s) for `members`.
///
/// Returns exactly one unpaginated page when pagination is disabled or the
/// members fit; otherwise one page per chunk, in chunk order.
pub fn paginate(spec: &NodeSpec, members: Vec<String>, pagination: &Pagination) -> Vec<Page> {
    if pagination.max == 0 || members.len() <= pagination.max {
        return vec![spec.page(spec.path.clone(), members)];
    }

    let base = chunk_base(&spec.path);
    let chunks: Vec<&[String]> = members.chunks(pagination.max).collect();
    let total = chunks.len();
    let paths: Vec<String> = (0..total)
        .map(|i| match i {
            0 => spec.path.clone(),
            _ => join_path(&[base.as_str(), pagination.segment.as_str(), &(i + 1).to_string()]),
        })
        .collect();

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut page = spec.page(paths[i].clone(), chunk.to_vec());
            page.variables.paginator = Some(Paginator {
                pages: chunk.to_vec(),
                number: i + 1,
                total,
                prev: i.checked_sub(1).map(|p| permalink_for(&paths[p])),
                next: paths.get(i + 1).map(|n| permalink_for(n)),
            });
            if i == 0 {
                page.variables
                    .aliases
                    .push(join_path(&[base.as_str(), pagination.segment.as_str(), "1"]));
            }
            page
        })
        .collect()
}

/// Directory the chunk paths of `path` are built under.
fn chunk_base(path: &str) -> String {
    let segments = path_segments(path);
    match segments.split_last() {
        Some((last, rest)) if *last == INDEX_MARKER => rest.join("/"),
        _ => segments.join("/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn members(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("post/{i}")).collect()
    }

    fn every_five() -> Pagination {
        Pagination {
            max: 5,
            segment: "page".into(),
        }
    }

    #[test]
    fn disabled_pagination_yields_one_page_with_all_members() {
        let spec = NodeSpec::new("blog", NodeType::Section, "Blog");
        let pages = paginate(&spec, members(12), &Pagination::disabled());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, "blog");
        assert_eq!(pages[0].members().len(), 12);
        assert!(pages[0].variables.paginator.is_none());
        assert!(pages[0].variables.aliases.is_empty());
    }

    #[test]
    fn list_that_fits_is_not_paginated() {
        let spec = NodeSpec::new("blog", NodeType::Section, "Blog");
        let pages = paginate(&spec, members(5), &every_five());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].variables.paginator.is_none());
    }

    #[test]
    fn twelve_pages_by_five_make_three_linked_chunks() {
        let spec = NodeSpec::new("blog", NodeType::Section, "Blog");
        let pages = paginate(&spec, members(12), &every_five());

        let ids: Vec<&str> = pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["blog", "blog/page/2", "blog/page/3"]);

        let nav: Vec<(Option<&str>, Option<&str>)> = pages
            .iter()
            .map(|p| {
                let pager = p.variables.paginator.as_ref().unwrap();
                (pager.prev.as_deref(), pager.next.as_deref())
            })
            .collect();
        assert_eq!(
            nav,
            vec![
                (None, Some("/blog/page/2/")),
                (Some("/blog/"), Some("/blog/page/3/")),
                (Some("/blog/page/2/"), None),
            ]
        );
        let numbers: Vec<(usize, usize)> = pages
            .iter()
            .map(|p| {
                let pager = p.variables.paginator.as_ref().unwrap();
                (pager.number, pager.total)
            })
            .collect();
        assert_eq!(numbers, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn chunks_reassemble_the_original_list() {
        let spec = NodeSpec::new("blog", NodeType::Section, "Blog");
        let original = members(12);
        let pages = paginate(&spec, original.clone(), &every_five());

        let rejoined: Vec<String> = pages.iter().flat_map(|p| p.members().to_vec()).collect();
        assert_eq!(rejoined, original);

        let from_paginator: Vec<String> = pages
            .iter()
            .flat_map(|p| p.variables.paginator.as_ref().unwrap().pages.clone())
            .collect();
        assert_eq!(from_paginator, original);
    }

    #[test]
    fn first_chunk_aliases_explicit_page_one() {
        let spec = NodeSpec::new("blog", NodeType::Section, "Blog");
        let pages = paginate(&spec, members(6), &every_five());
        assert_eq!(pages[0].variables.aliases, vec!["blog/page/1"]);
        assert!(pages[1].variables.aliases.is_empty());
    }

    #[test]
    fn index_paths_paginate_from_their_directory() {
        let spec = NodeSpec::new("index", NodeType::Homepage, "Home");
        let pages = paginate(&spec, members(6), &every_five());
        assert_eq!(pages[0].id, "index");
        assert_eq!(pages[0].variables.aliases, vec!["page/1"]);
        assert_eq!(pages[1].id, "page/2");
        assert_eq!(pages[1].permalink(), "/page/2/");
    }

    #[test]
    fn chunks_inherit_shared_attributes() {
        let mut spec = NodeSpec::new("tags/rust", NodeType::Taxonomy, "rust");
        spec.taxonomy = Some(TaxonomyRef {
            plural: "tags".into(),
            singular: "tag".into(),
            term: Some("rust".into()),
        });
        spec.extra.insert("count".into(), json!(11));
        let pages = paginate(&spec, members(11), &every_five());
        assert_eq!(pages.len(), 3);
        for page in &pages {
            assert_eq!(page.title, "rust");
            assert_eq!(page.node_type(), NodeType::Taxonomy);
            assert!(page.is_virtual());
            assert_eq!(page.variables.taxonomy, spec.taxonomy);
            assert_eq!(page.variables.get("count"), Some(&json!(11)));
        }
    }

    #[test]
    fn custom_segment() {
        let spec = NodeSpec::new("news", NodeType::Section, "News");
        let pagination = Pagination {
            max: 1,
            segment: "p".into(),
        };
        let pages = paginate(&spec, members(2), &pagination);
        assert_eq!(pages[1].id, "news/p/2");
        assert_eq!(pages[0].variables.aliases, vec!["news/p/1"]);
    }
}
