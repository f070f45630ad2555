//! # Plinth
//!
//! A static site compiler. A directory of Markdown content plus a set of
//! Jinja layouts becomes a complete static website.
//!
//! # Architecture: One Store, Sequential Phases
//!
//! Every phase reads and extends a single ordered [`store::PageStore`]:
//!
//! ```text
//! 1. Ingest      content/   →  one real page per content file
//! 2. Convert     pages      →  front matter merged, Markdown rendered to HTML
//! 3. Sections    pages      →  + one listing per section
//! 4. Taxonomies  pages      →  + term listings and vocabulary indexes
//! 5. Homepage    pages      →  + `index`, unless the content provides it
//! 6. Aliases     pages      →  + one redirect per alias
//! 7. Menus       pages      →  named, weight-ordered navigation menus
//! 8. Render      pages      →  public/**/index.html
//! 9. Assets      static/    →  public/
//! ```
//!
//! Phases never interleave: each one sees the store exactly as the previous
//! phase left it. Only rendering runs in parallel, since every page is written
//! to its own file and nothing is mutated any more.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`page`] | The page model: identity, node type, typed variables, permalinks |
//! | [`store`] | Ordered, id-keyed page collection |
//! | [`convert`] | Converter seam and the built-in front matter + Markdown converter |
//! | [`scan`] | Ingest and convert phases: content directory → real pages |
//! | [`synth`] | Section, taxonomy, homepage and alias synthesis |
//! | [`paginate`] | Splitting long listings into linked chunk pages |
//! | [`menu`] | Menu assembly from page metadata and config overrides |
//! | [`layout`] | Candidate cascade and layout resolution across site and theme |
//! | [`render`] | Renderer seam, minijinja renderer, redirect document, output paths |
//! | [`assets`] | Theme and site static file copying |
//! | [`pipeline`] | Build context, phase hooks and the build/check drivers |
//! | [`config`] | `plinth.toml` loading, defaults, merging and validation |
//! | [`output`] | CLI output formatting of build and check results |
//!
//! # Design Decisions
//!
//! ## Node Pages Are Ordinary Pages
//!
//! Section listings, taxonomy pages, the homepage, pagination chunks and
//! redirects are all [`page::Page`] values in the same store as content pages.
//! Layout resolution and rendering treat them uniformly; only the
//! [`page::NodeType`] decides which layout cascade applies.
//!
//! ## Synthesis Is Idempotent
//!
//! Every synthesized page is inserted only if its id is still free. Content
//! always wins: an `index.md` replaces the generated homepage, a `post.md`
//! replaces the generated `post` listing. Running a synthesis phase twice
//! adds nothing the second time.
//!
//! ## Failures Are Fatal
//!
//! A page without a layout, a missing theme or a broken front matter header
//! stops the build. Two conditions are only logged: an empty content
//! directory (the site is built empty) and a vocabulary index without a
//! layout (the index page is left out).
//!
//! ## Template Ids Are Source Paths
//!
//! Templates are addressed by their path relative to the source directory
//! (`layouts/_default/page.html`, `themes/paper/layouts/index.html`). The
//! same ids are used for resolution, rendering and `{% extends %}`.

pub mod assets;
pub mod config;
pub mod convert;
pub mod layout;
pub mod menu;
pub mod output;
pub mod page;
pub mod paginate;
pub mod pipeline;
pub mod render;
pub mod scan;
pub mod store;
pub mod synth;

#[cfg(test)]
pub(crate) mod test_helpers;
