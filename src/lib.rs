//! # Docit
//!
//! A minimal static site generator for project documentation. Every markdown
//! file in a directory tree becomes one HTML page with a shared navigation
//! bar and its own table of contents.
//!
//! # Architecture: One-Shot Pipeline
//!
//! Each build recomputes the whole site from disk. There is no cache and no
//! state carried between builds:
//!
//! ```text
//! 1. Scan      content/  →  paths       (every *.md file, sorted)
//! 2. Parse     paths     →  pages       (parallel: body HTML + TOC per file)
//! 3. Navigate  pages     →  nav links   (Home first, then scan order)
//! 4. Render    pages     →  build/      (parallel: template → index.html)
//! ```
//!
//! Watch mode runs the same pipeline again after every change, one build at a
//! time (see [`watch`]).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`build`] | Orchestrates one build: clean, scan, parse, navigate, render |
//! | [`scan`] | Recursive discovery of markdown files |
//! | [`page`] | One markdown file → [`types::Page`] |
//! | [`naming`] | Page title and link from a file's base name |
//! | [`markdown`] | Markdown → HTML conversion, heading anchor ids |
//! | [`headings`] | ATX heading recognition and anchor ids |
//! | [`toc`] | Heading list → nested table of contents → HTML |
//! | [`navigation`] | Site-wide navigation list |
//! | [`template`] | Go `text/template` page rendering |
//! | [`watch`] | Rebuild on change with at most one pending rebuild |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`types`] | Shared types passed between phases (`Page`, `NavLink`, `TocItem`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Flat Link Space
//!
//! A page's link depends on its base name only: `guides/install.md` and
//! `install.md` both become `/install`. Directories organise sources, not the
//! site. Colliding base names overwrite each other's output; the last page
//! written wins.
//!
//! ## Scan Order Is Site Order
//!
//! Files are scanned in file-name order, so page order (and therefore
//! navigation order) is the same on every build and on every platform.
//! Parallel parsing does not disturb it: results are collected by index.
//!
//! ## Text Templates
//!
//! Page templates use Go's `text/template` syntax through `gtmpl`, so existing
//! themes written for that syntax work unchanged. Nothing is HTML-escaped on
//! the way into the template; the page body and TOC are already HTML. The
//! TOC itself is produced with Maud, which escapes heading text.

pub mod build;
pub mod config;
pub mod headings;
pub mod markdown;
pub mod naming;
pub mod navigation;
pub mod output;
pub mod page;
pub mod scan;
pub mod template;
pub mod toc;
pub mod types;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
