//! ObjectStore trait definition
//!
//! This trait defines the storage operations the uploader needs.
//! It keeps the pipeline decoupled from the S3 SDK so it can be tested
//! against an in-memory store or a mock.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metadata::Metadata;

/// Object state returned by a head request
#[derive(Debug, Clone, Default)]
pub struct ObjectStat {
    /// Object key
    pub key: String,

    /// Committed size in bytes
    pub size: u64,

    /// Last modified timestamp
    pub last_modified: Option<Timestamp>,

    /// User metadata as stored by the service
    pub metadata: Metadata,
}

/// Listing entry for a bucket or object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key or bucket name
    pub key: String,

    /// Size in bytes (None for buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified (or creation) timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size, humansize::BINARY)),
            last_modified: None,
        }
    }

    /// Create a new ObjectInfo for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self {
            key: name.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
        }
    }
}

/// One page of a list operation
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    /// Listed objects
    pub items: Vec<ObjectInfo>,

    /// Continuation token when more items are available
    pub continuation_token: Option<String>,
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the whole content of `body` under `key` with user metadata
    ///
    /// The file handle is consumed and closed when the call returns.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: tokio::fs::File,
        content_type: Option<String>,
        metadata: &Metadata,
    ) -> Result<()>;

    /// Get committed size, timestamp and user metadata of an object
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectStat>;

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// List one page of objects under `prefix` (empty for the whole bucket)
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListResult>;
}
