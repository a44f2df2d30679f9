//! Page titles and links derived from file names.
//!
//! Every page's identity comes from its file's base name alone; the directory
//! it lives in does not matter:
//!
//! - `index.md` → title "Home", link `/`
//! - `guide.md` → title "Guide", link `/guide`
//! - `api/errors.md` → title "Errors", link `/errors`
//!
//! The `index` match is case-sensitive: `Index.md` is an ordinary page.

use std::path::Path;

/// Base name that maps to the site root.
pub const INDEX_STEM: &str = "index";

/// File name without directory or extension (`docs/guide.md` → `guide`).
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Page title for a base name.
pub fn title_for(base_name: &str) -> String {
    if base_name == INDEX_STEM {
        return "Home".to_string();
    }
    capitalize_first(base_name)
}

/// Site-relative link for a base name.
pub fn link_for(base_name: &str) -> String {
    if base_name == INDEX_STEM {
        return "/".to_string();
    }
    format!("/{base_name}")
}

/// Upper-case the first character, leaving the rest untouched.
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
