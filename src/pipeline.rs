//! The build driver.
//!
//! A build runs a fixed sequence of phases over one [`PageStore`]:
//!
//! ```text
//! Ingest → Convert → Sections → Taxonomies → Homepage → Aliases → Menus → Render → Assets
//! ```
//!
//! Each phase completes before the next starts. All settings live in an
//! immutable [`BuildContext`] created up front; setup problems (missing source,
//! theme or layouts) are reported there, before any phase runs.
//!
//! A [`PhaseObserver`] is notified around every phase. The CLI uses
//! [`TracingObserver`], tests use observers that record what they see.

use crate::assets::{self, AssetError};
use crate::config::{self, ConfigError, SiteConfig};
use crate::convert::{Converter, MarkdownConverter};
use crate::layout::{Layout, LayoutError, LayoutResolver, TemplateSource};
use crate::menu::{self, Menus};
use crate::page::NodeType;
use crate::paginate::Pagination;
use crate::render::{self, RenderError, RenderedPage, Renderer, TemplateRenderer};
use crate::scan::{self, ScanError};
use crate::store::{PageStore, StoreError};
use crate::synth;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("destination is not a directory: {}", .0.display())]
    InvalidDestination(PathBuf),
    #[error("theme `{name}` not found at {}", path.display())]
    ThemeNotFound { name: String, path: PathBuf },
    #[error("layouts directory not found: {}", .0.display())]
    LayoutsNotFound(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where to read the site from and where to write it.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    pub source: PathBuf,
    /// Root the configured `output.dir` is created under.
    pub dest: PathBuf,
}

/// Validated, read-only settings shared by every phase.
#[derive(Debug, Clone)]
pub struct BuildContext {
    source: PathBuf,
    dest: PathBuf,
    config: SiteConfig,
    theme_dir: Option<PathBuf>,
    resolver: LayoutResolver,
    pagination: Pagination,
}

impl BuildContext {
    /// Load `plinth.toml` from the source directory and check the directory
    /// layout it describes.
    pub fn new(options: BuildOptions) -> Result<Self, BuildError> {
        if !options.source.is_dir() {
            return Err(BuildError::SourceNotFound(options.source));
        }
        let config = config::load_config(&options.source)?;
        Self::with_config(options, config)
    }

    /// Like [`BuildContext::new`] with an already loaded config.
    pub fn with_config(options: BuildOptions, config: SiteConfig) -> Result<Self, BuildError> {
        let BuildOptions { source, dest } = options;
        if !source.is_dir() {
            return Err(BuildError::SourceNotFound(source));
        }
        if dest.exists() && !dest.is_dir() {
            return Err(BuildError::InvalidDestination(dest));
        }

        let theme_dir = match &config.theme {
            Some(name) => {
                let path = source.join(&config.themes.dir).join(name);
                if !path.is_dir() {
                    return Err(BuildError::ThemeNotFound {
                        name: name.clone(),
                        path,
                    });
                }
                Some(path)
            }
            None => None,
        };

        let site_layouts = source.join(&config.layouts.dir);
        let theme_layouts = theme_dir.as_ref().map(|t| t.join("layouts"));
        let theme_has_layouts = theme_layouts.as_ref().is_some_and(|p| p.is_dir());
        if !site_layouts.is_dir() && !theme_has_layouts {
            return Err(BuildError::LayoutsNotFound(site_layouts));
        }

        let resolver = LayoutResolver::new(
            config.layouts.dir.clone(),
            config
                .theme
                .as_ref()
                .map(|name| format!("{}/{}/layouts", config.themes.dir, name)),
        );
        let pagination = Pagination::from(&config.site.paginate);

        Ok(Self {
            source,
            dest,
            config,
            theme_dir,
            resolver,
            pagination,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn resolver(&self) -> &LayoutResolver {
        &self.resolver
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn content_dir(&self) -> PathBuf {
        self.source.join(&self.config.content.dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dest.join(&self.config.output.dir)
    }

    /// Static trees in copy order: theme first, then the site.
    pub fn static_dirs(&self) -> Vec<PathBuf> {
        self.theme_dir
            .iter()
            .map(|t| t.join("static"))
            .chain(std::iter::once(self.source.join(&self.config.static_files.dir)))
            .collect()
    }

    /// The `site` global handed to templates.
    pub fn site_value(&self) -> Result<serde_json::Value, BuildError> {
        #[derive(Serialize)]
        struct SiteContext<'a> {
            title: &'a str,
            base_url: &'a str,
            params: &'a toml::Table,
            taxonomies: &'a BTreeMap<String, String>,
        }
        let site = &self.config.site;
        Ok(serde_json::to_value(SiteContext {
            title: &site.title,
            base_url: &site.base_url,
            params: &site.params,
            taxonomies: &site.taxonomies,
        })?)
    }
}

// ============================================================================
// Phases and observers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ingest,
    Convert,
    Sections,
    Taxonomies,
    Homepage,
    Aliases,
    Menus,
    Render,
    Assets,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Ingest => "ingest",
            Phase::Convert => "convert",
            Phase::Sections => "sections",
            Phase::Taxonomies => "taxonomies",
            Phase::Homepage => "homepage",
            Phase::Aliases => "aliases",
            Phase::Menus => "menus",
            Phase::Render => "render",
            Phase::Assets => "assets",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hooks invoked around every phase with the store as it stands.
pub trait PhaseObserver {
    fn on_before_phase(&mut self, _phase: Phase, _store: &PageStore) {}
    fn on_after_phase(&mut self, _phase: Phase, _store: &PageStore) {}
}

/// Logs phase boundaries at debug/info level.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PhaseObserver for TracingObserver {
    fn on_before_phase(&mut self, phase: Phase, _store: &PageStore) {
        tracing::debug!(%phase, "Phase starting");
    }

    fn on_after_phase(&mut self, phase: Phase, store: &PageStore) {
        tracing::info!(%phase, pages = store.len(), "Phase complete");
    }
}

fn run_phase<F>(
    observer: &mut dyn PhaseObserver,
    phase: Phase,
    store: &mut PageStore,
    work: F,
) -> Result<(), BuildError>
where
    F: FnOnce(&mut PageStore) -> Result<(), BuildError>,
{
    observer.on_before_phase(phase, store);
    work(store)?;
    observer.on_after_phase(phase, store);
    Ok(())
}

// ============================================================================
// Drivers
// ============================================================================

/// The final page graph and its menus.
#[derive(Debug, Clone)]
pub struct Site {
    pub store: PageStore,
    pub menus: Menus,
}

/// Run every phase up to and including menu assembly.
pub fn compile<T>(
    ctx: &BuildContext,
    converter: &dyn Converter,
    templates: &T,
    observer: &mut dyn PhaseObserver,
) -> Result<Site, BuildError>
where
    T: TemplateSource + ?Sized,
{
    let config = ctx.config();
    let pagination = ctx.pagination();
    let mut store = PageStore::new();
    let mut sources = Vec::new();
    let mut menus = Menus::default();

    run_phase(observer, Phase::Ingest, &mut store, |store| {
        let ingested = scan::ingest(&ctx.content_dir(), &config.content.ext)?;
        *store = ingested.store;
        sources = ingested.sources;
        Ok(())
    })?;
    run_phase(observer, Phase::Convert, &mut store, |store| {
        *store = scan::convert_all(std::mem::take(store), &sources, converter)?;
        Ok(())
    })?;
    run_phase(observer, Phase::Sections, &mut store, |store| {
        synth::synthesize_sections(store, pagination)?;
        Ok(())
    })?;
    run_phase(observer, Phase::Taxonomies, &mut store, |store| {
        synth::synthesize_taxonomies(
            store,
            &config.site.taxonomies,
            pagination,
            ctx.resolver(),
            templates,
        )?;
        Ok(())
    })?;
    run_phase(observer, Phase::Homepage, &mut store, |store| {
        synth::synthesize_homepage(
            store,
            &config.site.title,
            &config.site.paginate.homepage.section,
            pagination,
        )?;
        Ok(())
    })?;
    run_phase(observer, Phase::Aliases, &mut store, |store| {
        synth::synthesize_aliases(store)?;
        Ok(())
    })?;
    run_phase(observer, Phase::Menus, &mut store, |store| {
        menus = menu::assemble(store, &config.site.menu);
        Ok(())
    })?;

    Ok(Site { store, menus })
}

/// Summary of a finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    /// Rendered pages in store order.
    pub pages: Vec<RenderedPage>,
    /// Distinct static files copied.
    pub assets: usize,
}

impl BuildReport {
    pub fn count(&self, node_type: NodeType) -> usize {
        self.pages
            .iter()
            .filter(|p| p.node_type == node_type && !p.is_redirect())
            .count()
    }

    pub fn redirects(&self) -> usize {
        self.pages.iter().filter(|p| p.is_redirect()).count()
    }
}

/// Compile, render and copy assets.
pub fn build(
    ctx: &BuildContext,
    renderer: &mut dyn Renderer,
    observer: &mut dyn PhaseObserver,
) -> Result<BuildReport, BuildError> {
    let converter = MarkdownConverter::new(ctx.config().frontmatter.format);
    let mut site = compile(ctx, &converter, &*renderer, observer)?;

    renderer.add_global("site", ctx.site_value()?);
    renderer.add_global("menus", site.menus.to_value());

    let output_dir = ctx.output_dir();
    let mut pages = Vec::new();
    run_phase(observer, Phase::Render, &mut site.store, |store| {
        pages = render::render_all(
            store,
            ctx.resolver(),
            &*renderer,
            &output_dir,
            &ctx.config().output.filename,
        )?;
        Ok(())
    })?;

    let mut assets = 0;
    run_phase(observer, Phase::Assets, &mut site.store, |_| {
        std::fs::create_dir_all(&output_dir)?;
        assets = assets::copy_static(&ctx.static_dirs(), &output_dir)?;
        Ok(())
    })?;

    Ok(BuildReport {
        output_dir,
        pages,
        assets,
    })
}

/// Result of a dry run.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub site: Site,
    /// Resolved layout per page, in store order.
    pub layouts: Vec<(String, Layout)>,
}

/// Compile the site and resolve every layout without writing anything.
pub fn check<T>(
    ctx: &BuildContext,
    templates: &T,
    observer: &mut dyn PhaseObserver,
) -> Result<CheckReport, BuildError>
where
    T: TemplateSource + ?Sized,
{
    let converter = MarkdownConverter::new(ctx.config().frontmatter.format);
    let site = compile(ctx, &converter, templates, observer)?;
    let layouts = site
        .store
        .iter()
        .map(|page| Ok((page.id.clone(), ctx.resolver().resolve(page, templates)?)))
        .collect::<Result<Vec<_>, LayoutError>>()?;
    Ok(CheckReport { site, layouts })
}

/// Build the site at `options.source` with the built-in renderer.
pub fn build_site(options: BuildOptions) -> Result<BuildReport, BuildError> {
    let ctx = BuildContext::new(options)?;
    let mut renderer = TemplateRenderer::new(ctx.source());
    build(&ctx, &mut renderer, &mut TracingObserver)
}

/// Dry-run the site at `options.source` with the built-in renderer.
pub fn check_site(options: BuildOptions) -> Result<CheckReport, BuildError> {
    let ctx = BuildContext::new(options)?;
    let renderer = TemplateRenderer::new(ctx.source());
    check(&ctx, &renderer, &mut TracingObserver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FakeTemplates, find_page, ids};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// A small blog: two posts, one about page, layouts dir present.
    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            root,
            "plinth.toml",
            "[site]\ntitle = \"Test\"\n[[site.menu]]\nmenu = \"main\"\nid = \"about\"\nweight = 50\n",
        );
        write(
            root,
            "content/post/first.md",
            "---\ntitle: First\ndate: 2024-01-01\ntags: [rust]\n---\nOne\n",
        );
        write(
            root,
            "content/post/second.md",
            "---\ntitle: Second\ndate: 2024-02-01\ntags: [rust, web]\naliases: [/old/second/]\n---\nTwo\n",
        );
        write(root, "content/about.md", "---\ntitle: About\n---\nUs\n");
        write(root, "static/robots.txt", "User-agent: *\n");
        fs::create_dir_all(root.join("layouts")).unwrap();
        tmp
    }

    fn options(tmp: &TempDir) -> BuildOptions {
        BuildOptions {
            source: tmp.path().to_path_buf(),
            dest: tmp.path().to_path_buf(),
        }
    }

    fn all_layouts() -> FakeTemplates {
        FakeTemplates::with(&[
            "layouts/_default/page.html",
            "layouts/_default/list.html",
            "layouts/_default/terms.html",
        ])
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl PhaseObserver for Recorder {
        fn on_before_phase(&mut self, phase: Phase, _store: &PageStore) {
            self.events.push(format!("before {phase}"));
        }
        fn on_after_phase(&mut self, phase: Phase, store: &PageStore) {
            self.events.push(format!("after {phase} {}", store.len()));
        }
    }

    // =========================================================================
    // Setup validation
    // =========================================================================

    #[test]
    fn missing_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = BuildContext::new(BuildOptions {
            source: tmp.path().join("nope"),
            dest: tmp.path().to_path_buf(),
        })
        .unwrap_err();
        assert!(matches!(err, BuildError::SourceNotFound(_)));
    }

    #[test]
    fn destination_file_is_fatal() {
        let tmp = project();
        write(tmp.path(), "out", "file");
        let err = BuildContext::new(BuildOptions {
            source: tmp.path().to_path_buf(),
            dest: tmp.path().join("out"),
        })
        .unwrap_err();
        assert!(matches!(err, BuildError::InvalidDestination(_)));
    }

    #[test]
    fn missing_layouts_is_fatal() {
        let tmp = project();
        fs::remove_dir(tmp.path().join("layouts")).unwrap();
        let err = BuildContext::new(options(&tmp)).unwrap_err();
        assert!(matches!(err, BuildError::LayoutsNotFound(_)));
    }

    #[test]
    fn missing_theme_is_fatal() {
        let tmp = project();
        write(tmp.path(), "plinth.toml", "theme = \"paper\"\n");
        let err = BuildContext::new(options(&tmp)).unwrap_err();
        match err {
            BuildError::ThemeNotFound { name, .. } => assert_eq!(name, "paper"),
            other => panic!("expected ThemeNotFound, got {other:?}"),
        }
    }

    #[test]
    fn theme_layouts_stand_in_for_site_layouts() {
        let tmp = project();
        fs::remove_dir(tmp.path().join("layouts")).unwrap();
        write(tmp.path(), "plinth.toml", "theme = \"paper\"\n");
        fs::create_dir_all(tmp.path().join("themes/paper/layouts")).unwrap();
        let ctx = BuildContext::new(options(&tmp)).unwrap();
        assert_eq!(ctx.resolver().dirs(), ["layouts", "themes/paper/layouts"]);
        assert_eq!(
            ctx.static_dirs(),
            vec![
                tmp.path().join("themes/paper/static"),
                tmp.path().join("static")
            ]
        );
    }

    #[test]
    fn invalid_config_is_fatal() {
        let tmp = project();
        write(tmp.path(), "plinth.toml", "[site]\ntitel = \"typo\"\n");
        let err = BuildContext::new(options(&tmp)).unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    // =========================================================================
    // Compile
    // =========================================================================

    #[test]
    fn compile_runs_phases_in_order() {
        let tmp = project();
        let ctx = BuildContext::new(options(&tmp)).unwrap();
        let converter = MarkdownConverter::default();
        let mut recorder = Recorder::default();
        compile(&ctx, &converter, &all_layouts(), &mut recorder).unwrap();

        let befores: Vec<&str> = recorder
            .events
            .iter()
            .filter_map(|e| e.strip_prefix("before "))
            .collect();
        assert_eq!(
            befores,
            vec![
                "ingest",
                "convert",
                "sections",
                "taxonomies",
                "homepage",
                "aliases",
                "menus"
            ]
        );
        assert_eq!(recorder.events[1], "after ingest 3");
    }

    #[test]
    fn compile_produces_the_page_graph() {
        let tmp = project();
        let ctx = BuildContext::new(options(&tmp)).unwrap();
        let site = compile(
            &ctx,
            &MarkdownConverter::default(),
            &all_layouts(),
            &mut TracingObserver,
        )
        .unwrap();

        assert_eq!(
            ids(&site.store),
            vec![
                "about",
                "post/first",
                "post/second",
                "post",
                "tags/rust",
                "tags/web",
                "tags",
                "index",
                "old/second",
            ]
        );
        let home = find_page(&site.store, "index");
        assert_eq!(home.title, "Test");
        assert_eq!(home.members(), ["post/second", "post/first"]);

        let main: Vec<&str> = site
            .menus
            .get("main")
            .unwrap()
            .sorted()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(main, vec!["index", "about", "post"]);
    }

    // =========================================================================
    // Build and check
    // =========================================================================

    #[test]
    fn build_writes_pages_and_assets() {
        let tmp = project();
        let ctx = BuildContext::new(options(&tmp)).unwrap();
        let mut renderer = all_layouts();
        let report = build(&ctx, &mut renderer, &mut TracingObserver).unwrap();

        let public = tmp.path().join("public");
        assert_eq!(report.output_dir, public);
        assert_eq!(report.assets, 1);
        assert_eq!(report.redirects(), 1);
        assert_eq!(report.count(NodeType::Taxonomy), 2);
        assert!(public.join("index.html").is_file());
        assert!(public.join("post/first/index.html").is_file());
        assert!(public.join("tags/rust/index.html").is_file());
        assert!(public.join("robots.txt").is_file());
        let redirect = fs::read_to_string(public.join("old/second/index.html")).unwrap();
        assert!(redirect.contains("url=/post/second/"));

        assert!(renderer.globals.contains_key("site"));
        assert_eq!(renderer.globals["menus"]["main"][0]["id"], "index");
    }

    #[test]
    fn check_reports_missing_layout_without_writing() {
        let tmp = project();
        let ctx = BuildContext::new(options(&tmp)).unwrap();
        let templates = FakeTemplates::with(&["layouts/_default/list.html"]);
        let err = check(&ctx, &templates, &mut TracingObserver).unwrap_err();
        assert!(matches!(err, BuildError::Layout(LayoutError::NotFound { .. })));
        assert!(!tmp.path().join("public").exists());
    }

    #[test]
    fn check_lists_resolved_layouts() {
        let tmp = project();
        let ctx = BuildContext::new(options(&tmp)).unwrap();
        let report = check(&ctx, &all_layouts(), &mut TracingObserver).unwrap();
        assert_eq!(report.layouts.len(), report.site.store.len());
        assert_eq!(
            report.layouts[0],
            (
                "about".to_string(),
                Layout::Template("layouts/_default/page.html".into())
            )
        );
    }
}
