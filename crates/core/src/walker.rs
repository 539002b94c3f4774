//! Files-root traversal
//!
//! [`TreeWalker`] is a lazy, depth-first sequence of classified entries.
//! It only classifies; deciding whether an entry is uploaded, skipped or
//! aborts the run is left to the caller.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path::is_sidecar;

/// A visited filesystem entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// Directory; its children follow
    Directory(PathBuf),
    /// Sidecar metadata file, never uploaded on its own
    Sidecar(PathBuf),
    /// File to upload
    Payload(PathBuf),
}

/// Depth-first walk over a files root
///
/// Entries within a directory are visited in file-name order so a run over
/// an unchanged tree always produces the same sequence. Symlinks are not
/// followed.
pub struct TreeWalker {
    inner: walkdir::IntoIter,
    sidecar_extension: String,
}

impl TreeWalker {
    /// Create a walker over `root`, treating `sidecar_extension` files as sidecars
    pub fn new(root: impl AsRef<Path>, sidecar_extension: &str) -> Self {
        let inner = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Self {
            inner,
            sidecar_extension: sidecar_extension.trim_start_matches('.').to_string(),
        }
    }

    fn classify(&self, entry: walkdir::DirEntry) -> Visit {
        let is_dir = entry.file_type().is_dir();
        let path = entry.into_path();
        if is_dir {
            Visit::Directory(path)
        } else if is_sidecar(&path, &self.sidecar_extension) {
            Visit::Sidecar(path)
        } else {
            Visit::Payload(path)
        }
    }
}

impl Iterator for TreeWalker {
    type Item = Result<Visit>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        Some(entry.map(|e| self.classify(e)).map_err(Error::traversal))
    }
}
