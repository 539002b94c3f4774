//! Error types for sup-core
//!
//! Two kinds of failure exist during a run. [`Error`] covers everything that
//! stops the run (bad configuration, an unreadable directory entry) and maps
//! to a process exit code. [`FileError`] covers a single payload that could
//! not be uploaded or verified; the walk logs it and moves on.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for sup-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Run-level error types
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error or missing setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A directory entry could not be read while walking the files root
    #[error("Cannot access {}: {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::Network(_) => 3,                       // NetworkError
            Error::Auth(_) => 4,                          // AuthError
            Error::NotFound(_) => 5,                      // NotFound
            Error::Conflict(_) => 6,                      // Conflict
            _ => 1,                                       // GeneralError
        }
    }

    /// Build a traversal error from a walkdir failure
    pub(crate) fn traversal(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        let source = match err.into_io_error() {
            Some(io) => io,
            None => std::io::Error::other("filesystem loop detected"),
        };
        Error::Traversal { path, source }
    }
}

/// Per-file failure; the payload is skipped and the walk continues
#[derive(Error, Debug)]
pub enum FileError {
    /// Payload could not be opened for reading
    #[error("Couldn't open {} for upload: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The put-object call failed
    #[error("Upload of '{key}' failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: Error,
    },

    /// The head call after upload failed
    #[error("Head request to object '{key}' failed: {source}")]
    Verify {
        key: String,
        #[source]
        source: Error,
    },
}

impl FileError {
    /// Object key or local path the failure refers to
    pub fn subject(&self) -> String {
        match self {
            FileError::Open { path, .. } => path.display().to_string(),
            FileError::Upload { key, .. } | FileError::Verify { key, .. } => key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::Conflict("test".into()).exit_code(), 6);
        assert_eq!(Error::General("test".into()).exit_code(), 1);

        let traversal = Error::Traversal {
            path: PathBuf::from("/data/locked"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(traversal.exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::Config("bucket is not set".into());
        assert_eq!(err.to_string(), "Configuration error: bucket is not set");

        let err = Error::Traversal {
            path: PathBuf::from("/data/locked"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Cannot access /data/locked: denied");
    }

    #[test]
    fn test_file_error_subject() {
        let err = FileError::Upload {
            key: "broken.bin".into(),
            source: Error::Network("connection reset".into()),
        };
        assert_eq!(err.subject(), "broken.bin");
        assert!(err.to_string().contains("connection reset"));

        let err = FileError::Open {
            path: PathBuf::from("/data/gone.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.subject(), "/data/gone.txt");
    }
}
