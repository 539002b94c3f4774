//! Upload pipeline
//!
//! Drives the tree walk and, for every payload, resolves and loads its sidecar,
//! uploads the file with the sidecar's metadata and confirms the result with a
//! head request. Payloads are processed one at a time, in walk order.
//!
//! Failure policy: a traversal error aborts the walk and is returned; a
//! failed upload or verification skips that payload only.

use std::path::Path;

use crate::config::{Config, KeyMode, DEFAULT_SIDECAR_EXTENSION};
use crate::error::{Error, FileError, Result};
use crate::inventory::{Inventory, UploadRecord};
use crate::metadata::{load_metadata, metadata_field};
use crate::path::{object_key, sidecar_path};
use crate::traits::ObjectStore;
use crate::walker::{TreeWalker, Visit};

/// Metadata field copied into [`UploadRecord::kind`]
pub const TYPE_FIELD: &str = "type";

/// Receives per-payload progress events
pub trait UploadObserver: Send + Sync {
    /// A payload is about to be processed
    fn on_start(&self, _path: &Path) {}

    /// A payload was uploaded and verified
    fn on_uploaded(&self, _record: &UploadRecord) {}

    /// A payload was skipped because of a per-file error
    fn on_skipped(&self, _path: &Path, _error: &FileError) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

/// Counters for one walk
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Payloads handed to the upload step
    pub payloads: usize,
    /// Payloads uploaded and verified
    pub uploaded: usize,
    /// Payloads skipped after an open, upload or verification failure
    pub failed: usize,
    /// Sidecar files passed over
    pub sidecars: usize,
    /// Payloads matching an exclude pattern
    pub excluded: usize,
}

/// Uploads a files root into a bucket
pub struct Uploader<S> {
    store: S,
    bucket: String,
    sidecar_extension: String,
    key_mode: KeyMode,
    exclude: Vec<glob::Pattern>,
}

impl<S: ObjectStore> Uploader<S> {
    /// Create an uploader with the default sidecar extension and key mode
    pub fn new(store: S, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            sidecar_extension: DEFAULT_SIDECAR_EXTENSION.to_string(),
            key_mode: KeyMode::default(),
            exclude: Vec::new(),
        }
    }

    /// Create an uploader from a validated configuration
    pub fn from_config(store: S, config: &Config) -> Result<Self> {
        config.validate()?;
        let exclude = config
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Config(format!("Invalid exclude pattern: {e}")))?;

        Ok(Self::new(store, &config.bucket)
            .with_sidecar_extension(config.sidecar_extension())
            .with_key_mode(config.key_mode)
            .with_exclude(exclude))
    }

    /// Set the sidecar extension (leading dot optional)
    pub fn with_sidecar_extension(mut self, extension: &str) -> Self {
        self.sidecar_extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Set how object keys are derived
    pub fn with_key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }

    /// Skip payloads whose file name matches any of `patterns`
    pub fn with_exclude(mut self, patterns: Vec<glob::Pattern>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Target bucket
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Walk `root` and upload every payload, appending verified records to `inventory`
    ///
    /// Returns the traversal error that stopped the walk, if any; records
    /// appended before it stay in `inventory`.
    pub async fn upload_tree(
        &self,
        root: &Path,
        inventory: &mut Inventory,
        observer: &dyn UploadObserver,
    ) -> Result<RunStats> {
        let walker = TreeWalker::new(root, &self.sidecar_extension);
        self.upload_visits(root, walker, inventory, observer).await
    }

    /// Process classified entries in order until they run out or one is an error
    pub(crate) async fn upload_visits<I>(
        &self,
        root: &Path,
        visits: I,
        inventory: &mut Inventory,
        observer: &dyn UploadObserver,
    ) -> Result<RunStats>
    where
        I: IntoIterator<Item = Result<Visit>>,
    {
        let mut stats = RunStats::default();

        for visit in visits {
            let visit = match visit {
                Ok(visit) => visit,
                Err(e) => {
                    tracing::debug!(error = %e, uploaded = stats.uploaded, "aborting walk");
                    return Err(e);
                }
            };

            match visit {
                Visit::Directory(path) => {
                    tracing::debug!(path = %path.display(), "entering directory");
                }
                Visit::Sidecar(path) => {
                    tracing::debug!(path = %path.display(), "skipping sidecar");
                    stats.sidecars += 1;
                }
                Visit::Payload(path) => {
                    if self.is_excluded(&path) {
                        tracing::debug!(path = %path.display(), "excluded by pattern");
                        stats.excluded += 1;
                        continue;
                    }

                    stats.payloads += 1;
                    observer.on_start(&path);

                    match self.upload_file(root, &path).await {
                        Ok(record) => {
                            observer.on_uploaded(&record);
                            inventory.push(record);
                            stats.uploaded += 1;
                        }
                        Err(e) => {
                            tracing::debug!(path = %path.display(), error = %e, "skipping file");
                            observer.on_skipped(&path, &e);
                            stats.failed += 1;
                        }
                    }
                }
            }
        }

        Ok(stats)
    }

    /// Upload one payload and verify it
    pub async fn upload_file(
        &self,
        root: &Path,
        payload: &Path,
    ) -> std::result::Result<UploadRecord, FileError> {
        let key = object_key(root, payload, self.key_mode).ok_or_else(|| FileError::Open {
            path: payload.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
        })?;

        let sidecar = load_metadata(&sidecar_path(payload, &self.sidecar_extension)).await;
        let metadata = sidecar.into_metadata();
        let expected_type = metadata_field(&metadata, TYPE_FIELD).map(str::to_string);

        let file = tokio::fs::File::open(payload)
            .await
            .map_err(|source| FileError::Open {
                path: payload.to_path_buf(),
                source,
            })?;
        let local_size = file.metadata().await.ok().map(|m| m.len());

        let content_type = mime_guess::from_path(payload)
            .first()
            .map(|m| m.essence_str().to_string());

        self.store
            .put_object(&self.bucket, &key, file, content_type, &metadata)
            .await
            .map_err(|source| FileError::Upload {
                key: key.clone(),
                source,
            })?;

        let stat = self
            .store
            .head_object(&self.bucket, &key)
            .await
            .map_err(|source| FileError::Verify {
                key: key.clone(),
                source,
            })?;

        let kind = metadata_field(&stat.metadata, TYPE_FIELD)
            .unwrap_or_default()
            .to_string();

        if let Some(local_size) = local_size
            && local_size != stat.size
        {
            tracing::warn!(key = %key, local_size, stored_size = stat.size, "stored size differs from local file");
        }
        if let Some(expected) = expected_type
            && expected != kind
        {
            tracing::warn!(key = %key, expected = %expected, stored = %kind, "stored type differs from sidecar");
        }

        tracing::info!(key = %key, size = stat.size, "uploaded");

        Ok(UploadRecord {
            key,
            size: stat.size,
            modified_date: stat.last_modified,
            kind,
        })
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.exclude.iter().any(|p| p.matches(name))
    }
}
