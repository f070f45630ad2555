//! Site configuration module.
//!
//! Handles loading, validating, and merging `plinth.toml`. The file lives in
//! the source directory; every key is optional and falls back to the stock
//! defaults below.
//!
//! ## Configuration Options
//!
//! ```toml
//! theme = "paper"              # Optional; resolved under themes.dir
//!
//! [content]
//! dir = "content"              # Content tree
//! ext = "md"                   # Extension of content files
//!
//! [frontmatter]
//! format = "yaml"              # "yaml" (--- fences) or "toml" (+++ fences)
//!
//! [static]
//! dir = "static"               # Copied verbatim into the output root
//!
//! [layouts]
//! dir = "layouts"
//!
//! [output]
//! dir = "public"               # Relative to the destination directory
//! filename = "index.html"      # Document written for directory-style URLs
//!
//! [themes]
//! dir = "themes"
//!
//! [site]
//! title = "My Site"
//! base_url = "https://example.com"
//!
//! [site.params]                # Free-form, exposed to templates as site.params
//! author = "Jane"
//!
//! [site.taxonomies]            # plural = singular; replaces the stock set
//! tags = "tag"
//! categories = "category"
//!
//! [site.paginate]
//! max = 10                     # 0 disables pagination
//! path = "page"                # /blog/page/2/
//!
//! [site.paginate.homepage]
//! section = "post"             # Section listed on the homepage
//!
//! [[site.menu]]                # Overrides, applied after page-derived entries
//! menu = "main"
//! id = "github"
//! name = "GitHub"
//! url = "https://github.com/example"
//! weight = 90
//!
//! [[site.menu]]
//! menu = "main"
//! id = "about"
//! disabled = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file inside the source directory.
pub const CONFIG_FILE: &str = "plinth.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `plinth.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Active theme name, looked up under `themes.dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub content: ContentConfig,
    pub frontmatter: FrontMatterConfig,
    #[serde(rename = "static")]
    pub static_files: StaticConfig,
    pub layouts: LayoutsConfig,
    pub output: OutputConfig,
    pub themes: ThemesConfig,
    pub site: SiteSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    pub dir: String,
    /// Content file extension, without the dot.
    pub ext: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: "content".to_string(),
            ext: "md".to_string(),
        }
    }
}

/// Front-matter header syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontMatterFormat {
    #[default]
    Yaml,
    Toml,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontMatterConfig {
    pub format: FrontMatterFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticConfig {
    pub dir: String,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            dir: "static".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutsConfig {
    pub dir: String,
}

impl Default for LayoutsConfig {
    fn default() -> Self {
        Self {
            dir: "layouts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output root, relative to the destination directory.
    pub dir: String,
    /// File written for directory-style permalinks.
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "public".to_string(),
            filename: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemesConfig {
    pub dir: String,
}

impl Default for ThemesConfig {
    fn default() -> Self {
        Self {
            dir: "themes".to_string(),
        }
    }
}

/// The `[site]` table: metadata exposed to templates plus the taxonomy,
/// pagination and menu settings the pipeline consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub title: String,
    pub base_url: String,
    /// Free-form values handed to templates untouched.
    pub params: toml::Table,
    /// Vocabulary plural name → singular label.
    pub taxonomies: BTreeMap<String, String>,
    pub paginate: PaginateConfig,
    /// Explicit menu overrides.
    pub menu: Vec<MenuOverride>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: String::new(),
            base_url: String::new(),
            params: toml::Table::new(),
            taxonomies: BTreeMap::from([
                ("categories".to_string(), "category".to_string()),
                ("tags".to_string(), "tag".to_string()),
            ]),
            paginate: PaginateConfig::default(),
            menu: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginateConfig {
    /// Pages per listing chunk; 0 disables pagination.
    pub max: usize,
    /// Path segment between a listing and its chunk number.
    pub path: String,
    pub homepage: HomepageConfig,
}

impl Default for PaginateConfig {
    fn default() -> Self {
        Self {
            max: 0,
            path: "page".to_string(),
            homepage: HomepageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HomepageConfig {
    /// Section whose pages the homepage lists.
    pub section: String,
}

impl Default for HomepageConfig {
    fn default() -> Self {
        Self {
            section: "post".to_string(),
        }
    }
}

/// One `[[site.menu]]` entry.
///
/// With `disabled = true` the entry `id` is removed from `menu`; otherwise
/// the given fields are upserted over whatever the pages produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuOverride {
    pub menu: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(default)]
    pub disabled: bool,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dirs = [
            ("content.dir", &self.content.dir),
            ("static.dir", &self.static_files.dir),
            ("layouts.dir", &self.layouts.dir),
            ("output.dir", &self.output.dir),
            ("themes.dir", &self.themes.dir),
        ];
        for (key, value) in dirs {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.content.ext.is_empty() || self.content.ext.starts_with('.') {
            return Err(ConfigError::Validation(
                "content.ext must be an extension without the leading dot".into(),
            ));
        }
        if !is_single_segment(&self.output.filename) {
            return Err(ConfigError::Validation(
                "output.filename must be a bare file name".into(),
            ));
        }
        if !is_single_segment(&self.site.paginate.path) {
            return Err(ConfigError::Validation(
                "site.paginate.path must be a single path segment".into(),
            ));
        }
        for (plural, singular) in &self.site.taxonomies {
            if plural.trim().is_empty() || singular.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "site.taxonomies names must not be empty".into(),
                ));
            }
        }
        if let Some(theme) = &self.theme
            && !is_single_segment(theme)
        {
            return Err(ConfigError::Validation(
                "theme must be a directory name".into(),
            ));
        }
        for entry in &self.site.menu {
            if entry.menu.is_empty() || entry.id.is_empty() {
                return Err(ConfigError::Validation(
                    "site.menu entries need both `menu` and `id`".into(),
                ));
            }
        }
        Ok(())
    }

    /// Look up a dotted key (`site.paginate.max`) over the full config,
    /// defaults included.
    pub fn get(&self, path: &str) -> Result<Option<toml::Value>, ConfigError> {
        let doc = toml::Value::try_from(self)?;
        Ok(lookup(&doc, path).cloned())
    }
}

fn is_single_segment(value: &str) -> bool {
    !value.is_empty() && !value.contains(['/', '\\']) && value != "." && value != ".."
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Tables a user config replaces wholesale instead of merging into.
const REPLACED_TABLES: &[(&str, &str)] = &[("site", "taxonomies")];

/// Remove from `base` every replaced table that `overlay` sets, so a site can
/// drop a stock vocabulary by leaving it out.
fn drop_replaced_tables(base: &mut toml::Value, overlay: &toml::Value) {
    for &(section, key) in REPLACED_TABLES {
        if overlay.get(section).and_then(|s| s.get(key)).is_some()
            && let Some(table) = base.get_mut(section).and_then(|s| s.as_table_mut())
        {
            table.remove(key);
        }
    }
}

/// Resolve a dotted path (`a.b.c`) inside a TOML document.
pub fn lookup<'a>(value: &'a toml::Value, path: &str) -> Option<&'a toml::Value> {
    path.split('.')
        .filter(|k| !k.is_empty())
        .try_fold(value, |current, key| current.get(key))
}

/// Load `plinth.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => {
            let mut base = base;
            drop_replaced_tables(&mut base, &ov);
            merge_toml(base, ov)
        }
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `plinth.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `plinth.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Plinth Configuration
# ====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Theme name, resolved as <themes.dir>/<theme>. Theme layouts are searched
# after the site's own layouts; theme static files are copied first and can
# be overridden by the site's static files.
# theme = "paper"

# ---------------------------------------------------------------------------
# Content
# ---------------------------------------------------------------------------
[content]
# Directory holding the content tree.
dir = "content"
# Extension of content files (without the dot).
ext = "md"

[frontmatter]
# Header syntax: "yaml" (fenced by ---) or "toml" (fenced by +++).
format = "yaml"

# ---------------------------------------------------------------------------
# Directories
# ---------------------------------------------------------------------------
[static]
dir = "static"

[layouts]
dir = "layouts"

[output]
# Output root, relative to the destination directory.
dir = "public"
# Document written for directory-style URLs (/blog/ -> blog/index.html).
filename = "index.html"

[themes]
dir = "themes"

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = ""
base_url = ""

# Free-form values exposed to templates as site.params.
[site.params]

# Vocabularies: plural name = singular label. Setting this table replaces
# the stock vocabularies instead of adding to them; an empty table turns
# taxonomies off.
[site.taxonomies]
categories = "category"
tags = "tag"

[site.paginate]
# Pages per listing; 0 disables pagination.
max = 0
# Segment between a listing and its page number: /blog/page/2/
path = "page"

[site.paginate.homepage]
# Section whose pages are listed on the homepage.
section = "post"

# Menu overrides, applied after entries derived from page front matter.
# [[site.menu]]
# menu = "main"
# id = "github"
# name = "GitHub"
# url = "https://github.com/example"
# weight = 90
#
# [[site.menu]]
# menu = "main"
# id = "about"
# disabled = true
"##
}
