//! sup-core: Core library for the sup uploader
//!
//! This crate provides the upload pipeline behind the sup CLI:
//! - Configuration loading and endpoint resolution
//! - Sidecar path derivation and metadata loading
//! - Files-root traversal
//! - Upload, head verification and the resulting inventory
//! - ObjectStore trait for storage operations
//!
//! This crate is independent of any specific S3 SDK so the pipeline can be
//! tested against in-memory stores and mocks.

pub mod config;
pub mod error;
pub mod inventory;
pub mod metadata;
pub mod path;
pub mod pipeline;
pub mod traits;
pub mod walker;

pub use config::{Config, ConfigManager, EndpointConfig, KeyMode};
pub use error::{Error, FileError, Result};
pub use inventory::{Inventory, UploadRecord};
pub use metadata::{load_metadata, Metadata, SidecarMetadata};
pub use path::{is_sidecar, object_key, sidecar_path};
pub use pipeline::{NoopObserver, RunStats, UploadObserver, Uploader};
pub use traits::{ListResult, ObjectInfo, ObjectStat, ObjectStore};
pub use walker::{TreeWalker, Visit};
