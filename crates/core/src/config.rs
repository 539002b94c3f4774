//! Configuration management
//!
//! This module loads the uploader configuration: target bucket, files root,
//! sidecar extension, key mode and (optionally) the storage endpoint.
//! The file is TOML at ~/.config/sup/config.toml by default; a path ending in
//! `.json` is read as JSON so existing `config.json` files keep working.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Default sidecar extension, compared case-insensitively
pub const DEFAULT_SIDECAR_EXTENSION: &str = "JSON";

/// How object keys are derived from payload paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyMode {
    /// Base file name only; identical names in different directories collide
    #[default]
    FileName,
    /// Path relative to the files root, `/`-separated
    RelativePath,
}

impl std::str::FromStr for KeyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file-name" => Ok(KeyMode::FileName),
            "relative-path" => Ok(KeyMode::RelativePath),
            other => Err(Error::Config(format!(
                "Unknown key mode '{other}'. Expected 'file-name' or 'relative-path'"
            ))),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for compatibility checks
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Target bucket name
    #[serde(default)]
    pub bucket: String,

    /// Root directory holding payload and sidecar files
    #[serde(default)]
    pub files: PathBuf,

    /// Extension marking sidecar metadata files
    #[serde(default = "default_sidecar_extension")]
    pub sidecar_extension: String,

    /// Object key derivation
    #[serde(default)]
    pub key_mode: KeyMode,

    /// Glob patterns matched against file names; matching payloads are skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Storage endpoint; falls back to environment variables when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointConfig>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_sidecar_extension() -> String {
    DEFAULT_SIDECAR_EXTENSION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            bucket: String::new(),
            files: PathBuf::new(),
            sidecar_extension: default_sidecar_extension(),
            key_mode: KeyMode::default(),
            exclude: Vec::new(),
            endpoint: None,
        }
    }
}

impl Config {
    /// Sidecar extension without a leading dot
    pub fn sidecar_extension(&self) -> &str {
        self.sidecar_extension.trim_start_matches('.')
    }

    /// Check that every setting required for an upload run is present
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config(
                "bucket is not set (use --bucket, SUP_BUCKET or the config file)".into(),
            ));
        }

        if self.files.as_os_str().is_empty() {
            return Err(Error::Config(
                "files root is not set (use --files, SUP_FILES or the config file)".into(),
            ));
        }

        if self.sidecar_extension().is_empty() {
            return Err(Error::Config("sidecar extension cannot be empty".into()));
        }

        for pattern in &self.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::Config(format!("Invalid exclude pattern '{pattern}': {e}"))
            })?;
        }

        Ok(())
    }
}

/// Connection details for an S3-compatible endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// S3 endpoint URL
    pub url: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Bucket lookup style: "auto", "path", or "dns"
    #[serde(default = "default_bucket_lookup")]
    pub bucket_lookup: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket_lookup() -> String {
    "auto".to_string()
}

/// Environment variable holding the endpoint URL
pub const ENV_ENDPOINT: &str = "ENDPOINT";
/// Environment variable holding the access key
pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret key
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding the region
pub const ENV_REGION: &str = "AWS_REGION";

impl EndpointConfig {
    /// Create an endpoint with default region and bucket lookup
    pub fn new(
        url: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: default_region(),
            bucket_lookup: default_bucket_lookup(),
        }
    }

    /// Read the endpoint from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the endpoint through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{name} not set")))
        };

        let mut endpoint = Self::new(
            required(ENV_ENDPOINT)?,
            required(ENV_ACCESS_KEY)?,
            required(ENV_SECRET_KEY)?,
        );
        if let Some(region) = lookup(ENV_REGION).filter(|v| !v.is_empty()) {
            endpoint.region = region;
        }
        Ok(endpoint)
    }

    /// Use the configured endpoint, or the environment when none is configured
    pub fn resolve(config: &Config) -> Result<Self> {
        let endpoint = match &config.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => Self::from_env()?,
        };
        endpoint.validate()?;
        Ok(endpoint)
    }

    /// Check the URL and lookup style
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.url)?;
        match self.bucket_lookup.as_str() {
            "auto" | "path" | "dns" => Ok(()),
            other => Err(Error::Config(format!(
                "Invalid bucket lookup '{other}'. Expected auto, path or dns"
            ))),
        }
    }

    /// Whether requests should use path-style addressing
    pub fn force_path_style(&self) -> bool {
        self.bucket_lookup == "path" || self.bucket_lookup == "auto"
    }
}

/// Configuration manager handles locating and loading the config file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("sup").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// A missing file yields the default configuration; flags and environment
    /// variables are expected to fill in the rest.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let is_json = self
            .config_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Config = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade sup.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }
}
