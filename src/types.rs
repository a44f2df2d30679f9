//! Shared types passed between the build phases.
//!
//! Everything here is created fresh by each build and dropped when it ends;
//! nothing is persisted. All types serialize so `docit check --json` can dump
//! the parsed site.

use serde::Serialize;
use std::path::PathBuf;

/// A page produced from one markdown file.
///
/// `title` and `link` depend only on the file's base name (see
/// [`crate::naming`]); `body` and `toc` are rendered HTML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// `Home` for `index.md`, otherwise the capitalized base name
    pub title: String,
    /// Site-relative path: `/` for `index.md`, otherwise `/<base name>`
    pub link: String,
    /// Body HTML from the markdown converter
    pub body: String,
    /// Table of contents HTML (empty when the document has no headings)
    pub toc: String,
    /// The table of contents `toc` was rendered from
    pub toc_items: Vec<TocItem>,
    /// Source file the page was parsed from
    pub source: PathBuf,
}

impl Page {
    /// Whether this is the site root page.
    pub fn is_home(&self) -> bool {
        self.link == "/"
    }
}

/// One entry of the site-wide navigation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub title: String,
    pub link: String,
}

impl NavLink {
    /// The synthetic entry every navigation list starts with.
    pub fn home() -> Self {
        Self {
            title: "Home".to_string(),
            link: "/".to_string(),
        }
    }
}

/// A node in a document's table of contents.
///
/// Children are owned, so the forest is acyclic by construction. Every child
/// has a strictly greater `level` than its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocItem {
    pub title: String,
    /// In-page anchor, e.g. `#getting-started`
    pub link: String,
    /// Heading level the item was built from (`##` = 2)
    pub level: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocItem>,
}
