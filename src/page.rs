//! Page parsing: one markdown file in, one [`Page`] out.
//!
//! The file is read once; the same text feeds both the markdown converter
//! (page body) and the TOC builder (table of contents). Title and link come
//! from the file name alone, see [`crate::naming`].

use crate::headings::extract_headings;
use crate::markdown::{MarkdownConverter, MarkdownError};
use crate::naming;
use crate::toc;
use crate::types::Page;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Markdown {
        path: PathBuf,
        #[source]
        source: MarkdownError,
    },
}

/// Parse the document at `path` into a [`Page`].
pub fn parse_page(path: &Path, converter: &impl MarkdownConverter) -> Result<Page, PageError> {
    let content = fs::read_to_string(path).map_err(|source| PageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let body = converter
        .to_html(&content)
        .map_err(|source| PageError::Markdown {
            path: path.to_path_buf(),
            source,
        })?;

    let toc_items = toc::build_toc(&extract_headings(&content));
    let base_name = naming::base_name(path);
    let page = Page {
        title: naming::title_for(&base_name),
        link: naming::link_for(&base_name),
        body,
        toc: toc::render_toc(&toc_items),
        toc_items,
        source: path.to_path_buf(),
    };

    tracing::debug!(path = %path.display(), link = %page.link, "parsed page");
    Ok(page)
}
