//! Path derivation
//!
//! Pure functions mapping a payload path to its sidecar path and to the object
//! key it is stored under. Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use crate::config::KeyMode;

/// Derive the sidecar path for a payload
///
/// The payload's last extension is replaced by `extension`:
/// `dir/photo.jpg` becomes `dir/photo.JSON`, `dir/archive.tar.gz` becomes
/// `dir/archive.tar.JSON`. The result may not exist.
pub fn sidecar_path(payload: &Path, extension: &str) -> PathBuf {
    let extension = extension.trim_start_matches('.');
    let stem = payload.file_stem().unwrap_or_default();

    let mut name = stem.to_os_string();
    name.push(".");
    name.push(extension);

    match payload.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Whether `path` is a sidecar file, comparing extensions case-insensitively
pub fn is_sidecar(path: &Path, extension: &str) -> bool {
    let extension = extension.trim_start_matches('.');
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Derive the object key for a payload under `root`
///
/// Returns `None` when the path has no file name (e.g. it ends in `..`).
pub fn object_key(root: &Path, payload: &Path, mode: KeyMode) -> Option<String> {
    match mode {
        KeyMode::FileName => payload
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        KeyMode::RelativePath => {
            let relative = payload.strip_prefix(root).unwrap_or(payload);
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            (!key.is_empty()).then_some(key)
        }
    }
}
