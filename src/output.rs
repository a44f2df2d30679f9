//! CLI output formatting.
//!
//! Output is information-first: each page leads with its positional index and
//! title, with the source file as an indented `Source:` line underneath.
//!
//! ## Build
//!
//! ```text
//! Pages
//! 001 Install → install/index.html
//!     Source: guides/install.md
//! 002 Home → index.html
//!     Source: index.md
//!
//! Built 2 pages in 14 ms
//! ```
//!
//! ## Check
//!
//! ```text
//! Pages
//! 001 Install (/install)
//!     Source: guides/install.md
//!     Installation
//!         From Source
//!
//! Navigation
//!     Home → /
//!     Install → /install
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::build::{BuildReport, SiteCheck};
use crate::types::{NavLink, TocItem};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Path shown to the user: relative to `root` when possible, `/` separated.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2} s", elapsed.as_secs_f64())
    } else {
        format!("{} ms", elapsed.as_millis())
    }
}

/// Flatten a TOC forest into indented title lines.
fn toc_lines(items: &[TocItem], depth: usize, lines: &mut Vec<String>) {
    for item in items {
        lines.push(format!("{}{}", indent(depth), item.title));
        toc_lines(&item.children, depth + 1, lines);
    }
}

fn navigation_lines(navigation: &[NavLink], lines: &mut Vec<String>) {
    lines.push("Navigation".to_string());
    for link in navigation {
        lines.push(format!("{}{} → {}", indent(1), link.title, link.link));
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the result of a build.
pub fn format_build_output(
    report: &BuildReport,
    content_root: &Path,
    output_root: &Path,
) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.pages.is_empty() {
        lines.push("Pages".to_string());
        for (i, page) in report.pages.iter().enumerate() {
            lines.push(format!(
                "{} {} → {}",
                format_index(i + 1),
                page.title,
                display_path(&page.output, output_root)
            ));
            lines.push(format!(
                "{}Source: {}",
                indent(1),
                display_path(&page.source, content_root)
            ));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "Built {} in {}",
        plural(report.pages.len(), "page"),
        format_elapsed(report.elapsed)
    ));
    lines
}

pub fn print_build_output(report: &BuildReport, content_root: &Path, output_root: &Path) {
    for line in format_build_output(report, content_root, output_root) {
        println!("{}", line);
    }
}

/// One-line summary used by watch mode after each rebuild.
pub fn format_rebuild_line(report: &BuildReport) -> String {
    format!(
        "Rebuilt {} in {}",
        plural(report.pages.len(), "page"),
        format_elapsed(report.elapsed)
    )
}

// ============================================================================
// Check
// ============================================================================

/// Format the page inventory and navigation of a checked site.
///
/// Each page lists its table of contents as an indented outline; the heading
/// anchors themselves are omitted.
pub fn format_check_output(site: &SiteCheck, content_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Pages".to_string());
    for (i, page) in site.pages.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            page.title,
            page.link
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            display_path(&page.source, content_root)
        ));
        toc_lines(&page.toc_items, 1, &mut lines);
    }

    lines.push(String::new());
    navigation_lines(&site.navigation, &mut lines);
    lines
}

pub fn print_check_output(site: &SiteCheck, content_root: &Path) {
    for line in format_check_output(site, content_root) {
        println!("{}", line);
    }
}
