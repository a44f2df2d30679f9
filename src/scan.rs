//! Content directory scanning.
//!
//! First step of a build: walk the content root and collect every markdown
//! file, at any depth. Nothing else about the tree matters; directories only
//! contribute the files inside them.
//!
//! ```text
//! docs/                      # Content root
//! ├── index.md               # → /          (Home)
//! ├── install.md             # → /install
//! ├── logo.png               # ignored
//! └── reference/
//!     ├── cli.md             # → /cli
//!     └── config.md          # → /config
//! ```
//!
//! Directories are walked depth-first with entries in file-name order, so two
//! scans of the same tree always return the same list. Any directory that
//! cannot be listed fails the whole scan.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot read content directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Extension that marks a file as a document. Matched exactly: `README.MD`
/// is not a document.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Return the paths of all documents under `root`, in scan order.
pub fn scan(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ScanError::Walk {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e,
        })?;
        if entry.file_type().is_file() && is_document(entry.path()) {
            documents.push(entry.into_path());
        }
    }

    tracing::debug!(root = %root.display(), count = documents.len(), "scanned content");
    Ok(documents)
}

fn is_document(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(DOCUMENT_EXTENSION))
}
