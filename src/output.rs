//! CLI output formatting for the build and check commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every page is shown by
//! its positional index and title, grouped by what kind of page it is; output
//! paths and layouts are secondary context. This makes the output readable as
//! a site inventory while still letting users trace a page to the file it
//! produced.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Pages
//!     001 About → about/index.html
//!     002 First → post/first/index.html
//! Sections
//!     001 post → post/index.html
//! Homepage
//!     001 My Site → index.html
//! Redirects
//!     001 old/first → old/first/index.html
//!
//! Built 2 pages, 1 section, 1 homepage, 1 redirect; copied 3 assets
//! ```
//!
//! ## Check
//!
//! ```text
//! Pages
//!     001 About
//!         Layout: layouts/_default/page.html
//! Redirects
//!     001 old/first → /post/first/
//!
//! Menus
//!     main
//!         001 My Site → /
//!         002 post → /post/
//!
//! Checked 3 pages, 1 menu
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::layout::Layout;
use crate::page::{NodeType, Page};
use crate::pipeline::{BuildReport, CheckReport};
use crate::render::RenderedPage;

/// Display order of page groups, with their heading and summary noun.
const GROUPS: [(NodeType, &str, &str); 5] = [
    (NodeType::Page, "Pages", "page"),
    (NodeType::Section, "Sections", "section"),
    (NodeType::Taxonomy, "Taxonomies", "taxonomy page"),
    (NodeType::Terms, "Vocabularies", "vocabulary index"),
    (NodeType::Homepage, "Homepage", "homepage"),
];

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`
fn counted(n: usize, noun: &str) -> String {
    match n {
        1 => format!("1 {noun}"),
        _ if noun.ends_with('y') && !noun.ends_with("ay") => {
            format!("{n} {}ies", &noun[..noun.len() - 1])
        }
        _ if noun.ends_with('x') => format!("{n} {noun}es"),
        _ => format!("{n} {noun}s"),
    }
}

/// Title to show for a page; untitled pages fall back to their id.
fn display_title<'a>(title: &'a str, id: &'a str) -> &'a str {
    if title.is_empty() { id } else { title }
}

// ============================================================================
// Build
// ============================================================================

/// Format the result of a build as an inventory of written files.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let relative = |page: &RenderedPage| -> String {
        page.output
            .strip_prefix(&report.output_dir)
            .unwrap_or(&page.output)
            .display()
            .to_string()
    };

    let mut lines = Vec::new();
    let mut summary = Vec::new();

    for (node_type, heading, noun) in GROUPS {
        let group: Vec<&RenderedPage> = report
            .pages
            .iter()
            .filter(|p| p.node_type == node_type && !p.is_redirect())
            .collect();
        if group.is_empty() {
            continue;
        }
        lines.push(heading.to_string());
        for (i, page) in group.iter().enumerate() {
            lines.push(format!(
                "{}{} {} \u{2192} {}",
                indent(1),
                format_index(i + 1),
                display_title(&page.title, &page.id),
                relative(page)
            ));
        }
        summary.push(counted(group.len(), noun));
    }

    let redirects: Vec<&RenderedPage> = report.pages.iter().filter(|p| p.is_redirect()).collect();
    if !redirects.is_empty() {
        lines.push("Redirects".to_string());
        for (i, page) in redirects.iter().enumerate() {
            lines.push(format!(
                "{}{} {} \u{2192} {}",
                indent(1),
                format_index(i + 1),
                page.id,
                relative(page)
            ));
        }
        summary.push(counted(redirects.len(), "redirect"));
    }

    if summary.is_empty() {
        summary.push(counted(0, "page"));
    }
    lines.push(String::new());
    lines.push(format!(
        "Built {}; copied {}",
        summary.join(", "),
        counted(report.assets, "asset")
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the result of a dry run: every page with its layout, then menus.
pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let pages: Vec<(&Page, &Layout)> = report
        .site
        .store
        .iter()
        .zip(report.layouts.iter().map(|(_, layout)| layout))
        .collect();

    let mut lines = Vec::new();
    for (node_type, heading, _) in GROUPS {
        let group: Vec<(&Page, &str)> = pages
            .iter()
            .filter(|(page, _)| page.node_type() == node_type)
            .filter_map(|(page, layout)| match layout {
                Layout::Template(template) => Some((*page, template.as_str())),
                Layout::Redirect => None,
            })
            .collect();
        if group.is_empty() {
            continue;
        }
        lines.push(heading.to_string());
        for (i, (page, template)) in group.iter().enumerate() {
            lines.push(format!(
                "{}{} {}",
                indent(1),
                format_index(i + 1),
                display_title(&page.title, &page.id)
            ));
            lines.push(format!("{}Layout: {}", indent(2), template));
        }
    }

    let redirects: Vec<&Page> = pages
        .iter()
        .filter(|(_, layout)| **layout == Layout::Redirect)
        .map(|(page, _)| *page)
        .collect();
    if !redirects.is_empty() {
        lines.push("Redirects".to_string());
        for (i, page) in redirects.iter().enumerate() {
            lines.push(format!(
                "{}{} {} \u{2192} {}",
                indent(1),
                format_index(i + 1),
                page.id,
                page.variables.destination.as_deref().unwrap_or_default()
            ));
        }
    }

    let menus = &report.site.menus;
    if !menus.is_empty() {
        lines.push(String::new());
        lines.push("Menus".to_string());
        for (name, menu) in menus.iter() {
            lines.push(format!("{}{}", indent(1), name));
            for (i, entry) in menu.sorted().iter().enumerate() {
                lines.push(format!(
                    "{}{} {} \u{2192} {}",
                    indent(2),
                    format_index(i + 1),
                    entry.name,
                    entry.url
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Checked {}, {}",
        counted(pages.len(), "page"),
        counted(menus.iter().count(), "menu")
    ));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
