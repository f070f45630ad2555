//! Content discovery and conversion.
//!
//! The first two build phases live here:
//!
//! 1. **Ingest** ([`ingest`]) walks the content directory and creates one real
//!    [`Page`] per content file, with identity and path fallbacks derived from
//!    the file's location.
//! 2. **Convert** ([`convert_all`]) runs every file through a [`Converter`] and
//!    merges the metadata and HTML into the page created for it.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── about.md                 # id "about", no section
//! ├── index.md                 # id "index" (suppresses the synthesized homepage)
//! ├── post/
//! │   ├── first-post.md        # id "post/first-post", section "post"
//! │   └── second-post.md
//! ├── .drafts/                 # Hidden entries are skipped
//! └── notes.txt                # Other extensions are ignored
//! ```
//!
//! ## Fallbacks
//!
//! - **Title**: file stem with `-`/`_` turned into spaces (`first-post` → "first post")
//! - **Section**: first directory component (`post/first-post.md` → "post")
//!
//! Front matter overrides both.

use crate::convert::{self, ConvertError, Converter};
use crate::page::Page;
use crate::store::{PageStore, StoreError};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{path}: {source}")]
    Convert {
        path: PathBuf,
        #[source]
        source: ConvertError,
    },
}

/// A content file backing a real page.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub id: String,
    pub path: PathBuf,
}

/// Result of the ingest phase.
#[derive(Debug, Default)]
pub struct Ingested {
    pub store: PageStore,
    pub sources: Vec<SourceFile>,
}

/// Walk `content_dir` and create one page per `*.{ext}` file.
///
/// A missing or empty content directory is not an error: it is logged and
/// the build continues with an empty store.
pub fn ingest(content_dir: &Path, ext: &str) -> Result<Ingested, ScanError> {
    let mut ingested = Ingested::default();
    if !content_dir.is_dir() {
        tracing::warn!(dir = %content_dir.display(), "Content directory not found");
        return Ok(ingested);
    }

    let walker = WalkDir::new(content_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_extension(entry.path(), ext) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(content_dir) else {
            continue;
        };
        let page = content_page(rel);
        ingested.sources.push(SourceFile {
            id: page.id.clone(),
            path: entry.path().to_path_buf(),
        });
        ingested.store.add(page)?;
    }

    if ingested.store.is_empty() {
        tracing::warn!(dir = %content_dir.display(), "No content files found");
    } else {
        tracing::debug!(pages = ingested.store.len(), "Content ingested");
    }
    Ok(ingested)
}

/// Read and convert every source file, merging results into the store.
///
/// Pages whose front matter sets `draft: true` are dropped from the returned
/// store.
pub fn convert_all(
    mut store: PageStore,
    sources: &[SourceFile],
    converter: &dyn Converter,
) -> Result<PageStore, ScanError> {
    for source in sources {
        let raw = fs::read_to_string(&source.path)?;
        let with_path = |e: ConvertError| ScanError::Convert {
            path: source.path.clone(),
            source: e,
        };
        let converted = converter.convert(&raw).map_err(with_path)?;
        let mut page = store
            .get(&source.id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(source.id.clone()))?;
        convert::merge_into(&mut page, converted).map_err(with_path)?;
        store.replace(&source.id, page)?;
    }

    let drafts: Vec<&str> = store
        .iter()
        .filter(|p| p.variables.is_draft())
        .map(|p| p.id.as_str())
        .collect();
    if drafts.is_empty() {
        return Ok(store);
    }
    tracing::info!(?drafts, "Skipping draft pages");
    Ok(store.filter(|p| !p.variables.is_draft()))
}

/// Build the ingest-time page for a content file at `rel` (relative to the
/// content root).
fn content_page(rel: &Path) -> Page {
    let parts: Vec<String> = rel
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let mut page = Page::new(parts.join("/"));
    if parts.len() > 1 {
        page.section = parts.first().cloned();
    }
    page.title = match parts.split_last() {
        Some((stem, [.., parent])) if stem == crate::page::INDEX_MARKER => display_title(parent),
        Some((stem, _)) => display_title(stem),
        None => String::new(),
    };
    page
}

/// `first-post` → "first post"
fn display_title(stem: &str) -> String {
    stem.replace(['-', '_'], " ")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}
