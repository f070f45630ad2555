//! Render dispatch.
//!
//! Every page of the final store is resolved to a layout, rendered and
//! written below the output directory:
//!
//! ```text
//! pathname        output file
//! index        →  public/index.html
//! docs/index   →  public/docs/index.html
//! blog/hello   →  public/blog/hello/index.html
//! feed.xml     →  public/feed.xml
//! ```
//!
//! Templates are rendered through the [`Renderer`] seam. [`TemplateRenderer`]
//! is the built-in implementation on top of minijinja; redirect pages never
//! reach it and are written as a fixed maud document instead.
//!
//! Pages are rendered in parallel with rayon. Each render only reads the
//! final store and writes its own file; output paths are checked for
//! collisions before anything is written.

use crate::layout::{Layout, LayoutError, LayoutResolver, TemplateSource};
use crate::page::{INDEX_MARKER, NodeType, Page, Paginator, TaxonomyRef, has_extension, path_segments};
use crate::store::PageStore;
use maud::{DOCTYPE, Markup, html};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("failed to render `{template}`: {message}")]
    Template { template: String, message: String },
    #[error("redirect page `{0}` has no destination")]
    MissingDestination(String),
    #[error("pages `{first}` and `{second}` both write {}", path.display())]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },
}

/// The external template engine as seen by the pipeline.
pub trait Renderer: TemplateSource + Sync {
    /// Render `template` with `context` as the root variable environment.
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError>;

    /// Register a value visible to every subsequent render.
    fn add_global(&mut self, name: &str, value: Value);
}

// ============================================================================
// Built-in renderer
// ============================================================================

/// minijinja environment loading templates from the source directory.
///
/// Template ids are paths relative to that directory
/// (`layouts/_default/page.html`, `themes/paper/layouts/index.html`), so
/// `{% extends %}` and `{% include %}` use the same naming.
pub struct TemplateRenderer {
    root: PathBuf,
    env: minijinja::Environment<'static>,
}

impl TemplateRenderer {
    pub fn new(root: &Path) -> Self {
        let mut env = minijinja::Environment::new();
        env.set_loader(minijinja::path_loader(root));
        Self {
            root: root.to_path_buf(),
            env,
        }
    }
}

impl TemplateSource for TemplateRenderer {
    fn exists(&self, template: &str) -> bool {
        self.root.join(template).is_file()
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        let fail = |e: minijinja::Error| RenderError::Template {
            template: template.to_string(),
            message: format!("{e:#}"),
        };
        self.env
            .get_template(template)
            .and_then(|t| t.render(context))
            .map_err(fail)
    }

    fn add_global(&mut self, name: &str, value: Value) {
        self.env
            .add_global(name.to_string(), minijinja::Value::from_serialize(&value));
    }
}

// ============================================================================
// Page context
// ============================================================================

/// A member page as listed by a node page.
#[derive(Debug, Serialize)]
pub struct PageSummary<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub permalink: String,
    pub section: Option<&'a str>,
    pub date: Option<String>,
}

impl<'a> PageSummary<'a> {
    fn of(page: &'a Page) -> Self {
        Self {
            id: &page.id,
            title: &page.title,
            permalink: page.permalink(),
            section: page.section.as_deref(),
            date: format_date(page),
        }
    }
}

/// Everything a template sees under `page`.
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub permalink: String,
    pub section: Option<&'a str>,
    pub date: Option<String>,
    pub node_type: NodeType,
    pub is_virtual: bool,
    pub html: &'a str,
    /// Member pages (the current chunk when paginated).
    pub pages: Vec<PageSummary<'a>>,
    pub paginator: Option<&'a Paginator>,
    pub taxonomy: Option<&'a TaxonomyRef>,
    /// Front-matter keys without a dedicated field.
    pub params: &'a BTreeMap<String, Value>,
}

impl<'a> PageContext<'a> {
    pub fn new(store: &'a PageStore, page: &'a Page) -> Self {
        Self {
            id: &page.id,
            title: &page.title,
            permalink: page.permalink(),
            section: page.section.as_deref(),
            date: format_date(page),
            node_type: page.node_type(),
            is_virtual: page.is_virtual(),
            html: &page.html,
            pages: page
                .members()
                .iter()
                .filter_map(|id| store.get(id))
                .map(PageSummary::of)
                .collect(),
            paginator: page.variables.paginator.as_ref(),
            taxonomy: page.variables.taxonomy.as_ref(),
            params: page.variables.extra(),
        }
    }
}

fn format_date(page: &Page) -> Option<String> {
    page.date.map(|d| d.format("%Y-%m-%d").to_string())
}

// ============================================================================
// Output
// ============================================================================

/// File a page is written to.
///
/// An `index` pathname writes the default file of its directory, a pathname
/// with an extension is written as is, anything else becomes a directory
/// holding the default file. Empty, `.` and `..` segments are dropped.
pub fn output_path(pathname: &str, out_dir: &Path, filename: &str) -> PathBuf {
    let segments = path_segments(pathname);
    let mut path = out_dir.to_path_buf();
    match segments.split_last() {
        Some((last, rest)) if *last == INDEX_MARKER => {
            path.extend(rest);
            path.push(filename);
        }
        Some((last, _)) if has_extension(last) => path.extend(&segments),
        _ => {
            path.extend(&segments);
            path.push(filename);
        }
    }
    path
}

/// Meta-refresh page pointing at `destination`.
pub fn redirect_document(destination: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="robots" content="noindex";
                meta http-equiv="refresh" content={ "0; url=" (destination) };
                link rel="canonical" href=(destination);
                title { (destination) }
            }
            body {
                p { "Moved to " a href=(destination) { (destination) } "." }
            }
        }
    }
}

/// Outcome of rendering one page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub id: String,
    pub title: String,
    pub node_type: NodeType,
    pub output: PathBuf,
    /// Template used; `None` for redirects.
    pub template: Option<String>,
}

impl RenderedPage {
    pub fn is_redirect(&self) -> bool {
        self.template.is_none()
    }
}

/// Resolve, render and write every page of `store`.
///
/// Results come back in store order. The first failure aborts the build.
pub fn render_all(
    store: &PageStore,
    resolver: &LayoutResolver,
    renderer: &dyn Renderer,
    out_dir: &Path,
    filename: &str,
) -> Result<Vec<RenderedPage>, RenderError> {
    let targets = plan_outputs(store, out_dir, filename)?;
    store
        .as_slice()
        .par_iter()
        .zip(targets)
        .map(|(page, output)| render_page(store, page, output, resolver, renderer))
        .collect()
}

fn plan_outputs(
    store: &PageStore,
    out_dir: &Path,
    filename: &str,
) -> Result<Vec<PathBuf>, RenderError> {
    let mut owners: HashMap<PathBuf, &str> = HashMap::with_capacity(store.len());
    let mut targets = Vec::with_capacity(store.len());
    for page in store {
        let path = output_path(&page.pathname, out_dir, filename);
        if let Some(first) = owners.insert(path.clone(), &page.id) {
            return Err(RenderError::OutputCollision {
                path,
                first: first.to_string(),
                second: page.id.clone(),
            });
        }
        targets.push(path);
    }
    Ok(targets)
}

fn render_page(
    store: &PageStore,
    page: &Page,
    output: PathBuf,
    resolver: &LayoutResolver,
    renderer: &dyn Renderer,
) -> Result<RenderedPage, RenderError> {
    let (body, template) = match resolver.resolve(page, renderer)? {
        Layout::Redirect => {
            let destination = page
                .variables
                .destination
                .as_deref()
                .ok_or_else(|| RenderError::MissingDestination(page.id.clone()))?;
            (redirect_document(destination).into_string(), None)
        }
        Layout::Template(template) => {
            let context = serde_json::json!({ "page": PageContext::new(store, page) });
            (renderer.render(&template, &context)?, Some(template))
        }
    };

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, body)?;
    tracing::debug!(id = %page.id, output = %output.display(), "Rendered page");

    Ok(RenderedPage {
        id: page.id.clone(),
        title: page.title.clone(),
        node_type: page.node_type(),
        output,
        template,
    })
}
