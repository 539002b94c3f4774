//! Sidecar metadata loading
//!
//! A sidecar is a flat JSON object of string keys to string values. Loading is
//! best-effort: every outcome other than a parsed mapping is logged and the
//! payload is uploaded without metadata.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::path::is_sidecar;

/// Object-level user metadata
pub type Metadata = HashMap<String, String>;

/// Outcome of reading a sidecar file
#[derive(Debug)]
pub enum SidecarMetadata {
    /// Sidecar parsed into a mapping
    Present(Metadata),
    /// No sidecar next to the payload
    Absent,
    /// Sidecar exists but could not be read
    Unreadable(std::io::Error),
    /// Sidecar content is not a flat string-to-string JSON object
    Malformed(serde_json::Error),
}

impl SidecarMetadata {
    /// The mapping to attach to the upload, empty unless present
    pub fn into_metadata(self) -> Metadata {
        match self {
            SidecarMetadata::Present(metadata) => metadata,
            _ => Metadata::new(),
        }
    }
}

/// Read and parse the sidecar at `path`
///
/// When `path` does not exist, a sibling with the same stem whose extension
/// differs only in case (`photo.json` for `photo.JSON`) is read instead.
pub async fn load_metadata(path: &Path) -> SidecarMetadata {
    let (path, content) = match read_sidecar(path).await {
        Ok(found) => found,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(sidecar = %path.display(), "no sidecar metadata, uploading without metadata");
            return SidecarMetadata::Absent;
        }
        Err(e) => {
            tracing::warn!(sidecar = %path.display(), error = %e, "sidecar metadata unreadable, uploading without metadata");
            return SidecarMetadata::Unreadable(e);
        }
    };

    match serde_json::from_slice::<Metadata>(&content) {
        Ok(metadata) => {
            tracing::debug!(sidecar = %path.display(), fields = metadata.len(), "loaded sidecar metadata");
            SidecarMetadata::Present(metadata)
        }
        Err(e) => {
            tracing::warn!(sidecar = %path.display(), error = %e, "sidecar metadata malformed, uploading without metadata");
            SidecarMetadata::Malformed(e)
        }
    }
}

async fn read_sidecar(path: &Path) -> std::io::Result<(PathBuf, Vec<u8>)> {
    match tokio::fs::read(path).await {
        Ok(content) => Ok((path.to_path_buf(), content)),
        Err(e) if e.kind() == ErrorKind::NotFound => match find_case_variant(path).await? {
            Some(variant) => {
                let content = tokio::fs::read(&variant).await?;
                Ok((variant, content))
            }
            None => Err(e),
        },
        Err(e) => Err(e),
    }
}

/// Find a sibling of `path` with the same stem and a case-variant extension
///
/// Several variants resolve to the lexically smallest name.
async fn find_case_variant(path: &Path) -> std::io::Result<Option<PathBuf>> {
    let (Some(stem), Some(extension)) = (
        path.file_stem(),
        path.extension().and_then(|ext| ext.to_str()),
    ) else {
        return Ok(None);
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut variants = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let candidate = entry.path();
        if candidate.file_stem() == Some(stem) && is_sidecar(&candidate, extension) {
            variants.push(candidate);
        }
    }
    variants.sort();
    Ok(variants.into_iter().next())
}

/// Look up `field` in metadata echoed by the storage service
///
/// S3 lowercases user metadata keys, so an exact match is tried first and a
/// case-insensitive one second.
pub fn metadata_field<'a>(metadata: &'a Metadata, field: &str) -> Option<&'a str> {
    metadata
        .get(field)
        .or_else(|| {
            metadata
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(field))
                .map(|(_, v)| v)
        })
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_present() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.JSON");
        std::fs::write(&path, r#"{"type": "image", "camera": "X100"}"#).unwrap();

        let loaded = load_metadata(&path).await;
        assert!(matches!(loaded, SidecarMetadata::Present(_)));
        let metadata = loaded.into_metadata();
        assert_eq!(metadata.get("type").map(String::as_str), Some("image"));
        assert_eq!(metadata.len(), 2);
    }

    #[tokio::test]
    async fn test_load_lowercase_variant() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("photo.json"), r#"{"type": "image"}"#).unwrap();
        std::fs::write(dir.path().join("photograph.json"), r#"{"type": "other"}"#).unwrap();

        let metadata = load_metadata(&dir.path().join("photo.JSON"))
            .await
            .into_metadata();
        assert_eq!(metadata.get("type").map(String::as_str), Some("image"));
    }

    #[tokio::test]
    async fn test_load_variant_needs_same_stem() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("photo2.json"), r#"{"type": "image"}"#).unwrap();

        let loaded = load_metadata(&dir.path().join("photo.JSON")).await;
        assert!(matches!(loaded, SidecarMetadata::Absent));
    }

    #[tokio::test]
    async fn test_load_absent() {
        let dir = TempDir::new().unwrap();
        let loaded = load_metadata(&dir.path().join("missing.JSON")).await;
        assert!(matches!(loaded, SidecarMetadata::Absent));
        assert!(loaded.into_metadata().is_empty());
    }

    #[tokio::test]
    async fn test_load_absent_directory() {
        let dir = TempDir::new().unwrap();
        let loaded = load_metadata(&dir.path().join("gone").join("photo.JSON")).await;
        assert!(matches!(loaded, SidecarMetadata::Absent));
    }

    #[tokio::test]
    async fn test_load_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.JSON");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_metadata(&path).await,
            SidecarMetadata::Malformed(_)
        ));
    }

    #[tokio::test]
    async fn test_load_non_string_values_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested.JSON");
        std::fs::write(&path, r#"{"type": "image", "width": 1024}"#).unwrap();
        let loaded = load_metadata(&path).await;
        assert!(matches!(loaded, SidecarMetadata::Malformed(_)));
        assert!(loaded.into_metadata().is_empty());
    }

    #[tokio::test]
    async fn test_load_directory_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folder.JSON");
        std::fs::create_dir(&path).unwrap();
        assert!(matches!(
            load_metadata(&path).await,
            SidecarMetadata::Unreadable(_)
        ));
    }

    #[test]
    fn test_metadata_field_lookup() {
        let mut metadata = Metadata::new();
        metadata.insert("Type".into(), "image".into());
        assert_eq!(metadata_field(&metadata, "type"), Some("image"));

        metadata.insert("type".into(), "exact".into());
        assert_eq!(metadata_field(&metadata, "type"), Some("exact"));

        assert_eq!(metadata_field(&Metadata::new(), "type"), None);
    }
}
