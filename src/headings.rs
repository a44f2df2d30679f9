//! Heading extraction.
//!
//! A heading is any line whose first non-space character is `#`. The number of
//! leading `#` characters is the heading level:
//!
//! ```text
//! # Install            → level 1, "Install"
//!   ## From source     → level 2, "From source"
//! ### Flags ###        → level 3, "Flags"   (closing sequence dropped)
//! ```
//!
//! Lines are matched textually; no markdown parsing happens here.

/// The character whose repetition marks heading depth.
pub const HEADING_MARKER: char = '#';

/// A heading line split into its level and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Count of contiguous markers at the start of the line (always >= 1)
    pub level: usize,
    /// Remaining content with markers and surrounding whitespace stripped
    pub text: String,
}

impl Heading {
    /// Parse a single line. Returns `None` unless the first non-space
    /// character is the heading marker.
    pub fn parse(line: &str) -> Option<Heading> {
        let line = line.trim();
        let rest = line.trim_start_matches(HEADING_MARKER);
        let level = line.len() - rest.len();
        if level == 0 {
            return None;
        }

        Some(Heading {
            level,
            text: strip_closing_sequence(rest.trim()).to_string(),
        })
    }

    /// Anchor id for this heading: lowercase, spaces replaced by hyphens.
    pub fn anchor_id(&self) -> String {
        self.text.replace(' ', "-").to_lowercase()
    }

    /// In-page link to this heading, e.g. `#getting-started`.
    pub fn anchor_link(&self) -> String {
        format!("#{}", self.anchor_id())
    }
}

/// Returns the headings of a document in source order.
///
/// A document without headings yields an empty vector.
pub fn extract_headings(content: &str) -> Vec<Heading> {
    content.lines().filter_map(Heading::parse).collect()
}

/// Drop an optional trailing `###` run, which only counts as a closing
/// sequence when preceded by whitespace (`C#` stays `C#`).
fn strip_closing_sequence(text: &str) -> &str {
    let without = text.trim_end_matches(HEADING_MARKER);
    if without.len() == text.len() {
        return text;
    }
    if without.is_empty() {
        return without;
    }
    if without.ends_with(char::is_whitespace) {
        without.trim_end()
    } else {
        text
    }
}
