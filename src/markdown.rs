//! Markdown to HTML conversion.
//!
//! The build treats conversion as a black box behind [`MarkdownConverter`]:
//! text in, HTML out, no side effects. [`CommonMark`] is the implementation
//! used by default, backed by `pulldown-cmark` with the GitHub extensions
//! (tables, strikethrough, task lists, footnotes).
//!
//! ATX headings get an `id` attribute computed exactly like the TOC anchors
//! (see [`crate::headings::Heading::anchor_id`]), so `#getting-started` in the
//! table of contents lands on `<h2 id="getting-started">`.

use crate::headings::Heading;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html as md_html};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("Markdown conversion failed: {0}")]
    Conversion(String),
}

/// Converts a markdown document into an HTML fragment.
///
/// Implementations are shared across the parse workers, hence `Sync`, and
/// must be deterministic for rebuilds to be reproducible.
pub trait MarkdownConverter: Sync {
    fn to_html(&self, source: &str) -> Result<String, MarkdownError>;
}

/// GitHub-flavored CommonMark via `pulldown-cmark`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMark;

impl CommonMark {
    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES
    }
}

impl MarkdownConverter for CommonMark {
    fn to_html(&self, source: &str) -> Result<String, MarkdownError> {
        let events = Parser::new_ext(source, Self::options())
            .into_offset_iter()
            .map(|(event, range)| match event {
                Event::Start(Tag::Heading {
                    level,
                    id: None,
                    classes,
                    attrs,
                }) => Event::Start(Tag::Heading {
                    level,
                    id: heading_id(&source[range]).map(CowStr::from),
                    classes,
                    attrs,
                }),
                other => other,
            });

        let mut html = String::with_capacity(source.len() * 3 / 2);
        md_html::push_html(&mut html, events);
        Ok(html)
    }
}

/// Anchor id for the heading whose source starts `source`. Setext headings
/// (underlined with `===`) don't start with a marker and get no id.
fn heading_id(source: &str) -> Option<String> {
    source
        .lines()
        .next()
        .and_then(Heading::parse)
        .map(|h| h.anchor_id())
}
