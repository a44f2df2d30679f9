//! Table of contents generation.
//!
//! Converts the flat heading sequence of a document into a nested forest of
//! [`TocItem`]s and renders it as nested HTML lists.
//!
//! ## Nesting Rules
//!
//! The outermost call starts with the first heading's level as its
//! *baseline*, so a document may start at `##` or deeper. Walking the
//! headings in order, each one is compared with the next:
//!
//! - **Same level, or end of document**: the heading is a sibling.
//! - **Next is deeper**: the run of deeper headings is parsed recursively,
//!   with the deeper level as the new baseline, and attached as children.
//!   Jumps of more than one level nest directly; no placeholder levels are
//!   synthesized.
//! - **Next is shallower**: a nested call returns to its caller, which
//!   re-examines the shallower heading against its own baseline. At the top
//!   level there is no caller, so the baseline drops to the shallower level.
//!
//! ```text
//! # A          A
//! ## B         ├── B
//! ## C         └── C
//! ### D            └── D
//! # E          E
//! ## F         └── F
//! ```
//!
//! ## Markup
//!
//! ```html
//! <ul id="table-of-contents">
//!   <li><a href="#a">A</a></li>
//!   <ul><li><a href="#b">B</a></li></ul>
//! </ul>
//! ```
//!
//! A document without headings renders as an empty string.

use crate::headings::{Heading, extract_headings};
use crate::types::TocItem;
use maud::{Markup, html};

/// Build the TOC forest for a heading sequence.
pub fn build_toc(headings: &[Heading]) -> Vec<TocItem> {
    let Some(first) = headings.first() else {
        return Vec::new();
    };
    let (items, _) = parse_level(headings, 0, first.level, 0);
    items
}

/// Parse headings starting at `position` against the baseline `level`.
///
/// Returns the items produced at this nesting level and the position of the
/// first heading not consumed. `depth` is 0 for the outermost call; nested
/// calls stop at the first heading shallower than their baseline, while the
/// outermost call lowers its baseline instead.
pub fn parse_level(
    headings: &[Heading],
    mut position: usize,
    mut level: usize,
    depth: usize,
) -> (Vec<TocItem>, usize) {
    let mut items = Vec::new();

    while let Some(heading) = headings.get(position) {
        if heading.level < level {
            if depth > 0 {
                return (items, position);
            }
            level = heading.level;
        }

        let mut item = TocItem {
            title: heading.text.clone(),
            link: heading.anchor_link(),
            level: heading.level,
            children: Vec::new(),
        };
        position += 1;

        if let Some(next) = headings.get(position)
            && next.level > heading.level
        {
            let (children, next_position) = parse_level(headings, position, next.level, depth + 1);
            item.children = children;
            position = next_position;
        }

        items.push(item);
    }

    (items, position)
}

/// Render a TOC forest as HTML. Empty forests render as an empty string.
pub fn render_toc(items: &[TocItem]) -> String {
    if items.is_empty() {
        return String::new();
    }

    html! {
        ul id="table-of-contents" {
            @for item in items {
                (render_item(item))
            }
        }
    }
    .into_string()
}

fn render_item(item: &TocItem) -> Markup {
    html! {
        li { a href=(item.link) { (item.title) } }
        @if !item.children.is_empty() {
            ul {
                @for child in &item.children {
                    (render_item(child))
                }
            }
        }
    }
}

/// Extract, build, and render the TOC of a markdown document in one step.
pub fn toc_html(content: &str) -> String {
    render_toc(&build_toc(&extract_headings(content)))
}
