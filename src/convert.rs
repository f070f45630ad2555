//! Content conversion: raw file text → metadata map + HTML body.
//!
//! The pipeline only depends on the [`Converter`] trait. The built-in
//! [`MarkdownConverter`] understands a fenced front-matter header (YAML
//! between `---` lines or TOML between `+++` lines) followed by a Markdown
//! body rendered with `pulldown-cmark`.
//!
//! [`merge_into`] folds a conversion result into a [`Page`]: reserved keys
//! become page attributes, everything else is kept as open variables.

use crate::config::FrontMatterFormat;
use crate::page::{MenuSpec, Page, path_segments};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use pulldown_cmark::{Options, Parser, html as md_html};
use serde_json::{Map, Value};
use thiserror::Error;

pub type Metadata = Map<String, Value>;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("YAML front matter error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML front matter error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("front matter must be a mapping")]
    NotAMapping,
    #[error("unterminated front matter (missing closing `{0}`)")]
    Unterminated(&'static str),
    #[error("invalid `{key}` value: {reason}")]
    InvalidField { key: String, reason: String },
}

/// Output of converting one content file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Converted {
    pub metadata: Metadata,
    pub html: String,
}

pub trait Converter: Sync {
    fn convert(&self, raw: &str) -> Result<Converted, ConvertError>;
}

/// Front matter + Markdown converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter {
    format: FrontMatterFormat,
}

impl MarkdownConverter {
    pub fn new(format: FrontMatterFormat) -> Self {
        Self { format }
    }

    fn fence(&self) -> &'static str {
        match self.format {
            FrontMatterFormat::Yaml => "---",
            FrontMatterFormat::Toml => "+++",
        }
    }

    fn parse_header(&self, header: &str) -> Result<Metadata, ConvertError> {
        if header.trim().is_empty() {
            return Ok(Metadata::new());
        }
        match self.format {
            FrontMatterFormat::Yaml => match serde_yaml::from_str::<Value>(header)? {
                Value::Object(map) => Ok(map),
                Value::Null => Ok(Metadata::new()),
                _ => Err(ConvertError::NotAMapping),
            },
            FrontMatterFormat::Toml => {
                let table: toml::Table = toml::from_str(header)?;
                Ok(table
                    .into_iter()
                    .map(|(k, v)| (k, toml_to_json(v)))
                    .collect())
            }
        }
    }
}

impl Converter for MarkdownConverter {
    fn convert(&self, raw: &str) -> Result<Converted, ConvertError> {
        let fence = self.fence();
        let (metadata, body) = match split_front_matter(raw, fence)? {
            Some((header, body)) => (self.parse_header(header)?, body),
            None => (Metadata::new(), raw),
        };
        Ok(Converted {
            metadata,
            html: markdown_to_html(body),
        })
    }
}

/// Split `raw` into (header, body) when it opens with `fence` on its own line.
fn split_front_matter<'a>(
    raw: &'a str,
    fence: &'static str,
) -> Result<Option<(&'a str, &'a str)>, ConvertError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let Some(rest) = raw.strip_prefix(fence) else {
        return Ok(None);
    };
    let Some(rest) = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
    else {
        // `----` or `--- text` is body content, not a fence.
        return Ok(None);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == fence {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(Some((header, body)));
        }
        offset += line.len();
    }
    Err(ConvertError::Unterminated(fence))
}

fn markdown_to_html(body: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(body, options);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

/// TOML → JSON, rendering datetimes as their TOML text form.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Parse a front-matter date: RFC 3339, a naive datetime, or a bare date.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Fold a conversion result into `page`.
///
/// Reserved keys (`title`, `section`, `date`, `permalink`, `layout`, `menu`,
/// `aliases`) set attributes or typed variables; all other keys are stored
/// as open variables under their own names.
pub fn merge_into(page: &mut Page, converted: Converted) -> Result<(), ConvertError> {
    page.html = converted.html;
    for (key, value) in converted.metadata {
        match key.as_str() {
            "title" => page.title = expect_string(&key, &value)?,
            "section" => {
                let section = expect_string(&key, &value)?;
                page.section = (!section.trim().is_empty()).then_some(section);
            }
            "date" => {
                let raw = expect_string(&key, &value)?;
                let date = parse_date(&raw).ok_or_else(|| invalid(&key, "unrecognized date"))?;
                page.date = Some(date);
            }
            "permalink" => {
                let permalink = expect_string(&key, &value)?;
                let pathname = path_segments(&permalink).join("/");
                if pathname.is_empty() {
                    return Err(invalid(&key, "permalink must name a path"));
                }
                page.pathname = pathname;
            }
            "layout" => page.layout = Some(expect_string(&key, &value)?),
            "menu" => {
                let spec: MenuSpec = serde_json::from_value(value)
                    .map_err(|e| invalid(&key, &e.to_string()))?;
                page.variables.menu = Some(spec);
            }
            "aliases" => page.variables.aliases = string_list(&key, value)?,
            _ => page.variables.set(key, value),
        }
    }
    Ok(())
}

fn invalid(key: &str, reason: &str) -> ConvertError {
    ConvertError::InvalidField {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn expect_string(key: &str, value: &Value) -> Result<String, ConvertError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid(key, "expected a string")),
    }
}

fn string_list(key: &str, value: Value) -> Result<Vec<String>, ConvertError> {
    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(invalid(key, "expected a list of strings")),
            })
            .collect(),
        _ => Err(invalid(key, "expected a string or a list of strings")),
    }
}
