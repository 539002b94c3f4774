//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations, plus the
//! configuration and client setup they share.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sup_core::{Config, ConfigManager, EndpointConfig};
use sup_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod ls;
mod mb;
pub mod upload;

/// sup - upload a directory tree with sidecar metadata
///
/// Uploads every file under a directory to an S3-compatible bucket, attaching
/// the key/value pairs from a matching sidecar JSON file as object metadata,
/// and verifies each object after upload.
#[derive(Parser, Debug)]
#[command(name = "sup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Configuration file (TOML, or JSON when the name ends in .json)
    #[arg(short, long, global = true, env = "SUP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a files root with sidecar metadata and verify every object
    Upload(upload::UploadArgs),

    /// Create the target bucket
    Mb(mb::MbArgs),

    /// List buckets, or objects in a bucket
    Ls(ls::LsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Upload(args) => upload::execute(args, config_path, output_config).await,
        Commands::Mb(args) => mb::execute(args, config_path, output_config).await,
        Commands::Ls(args) => ls::execute(args, config_path, output_config).await,
    }
}

/// Load the config file, from `path` or the default location
pub(crate) fn load_config(path: Option<&Path>) -> sup_core::Result<Config> {
    let manager = match path {
        Some(p) => ConfigManager::with_path(p.to_path_buf()),
        None => ConfigManager::new()?,
    };
    tracing::debug!(path = %manager.config_path().display(), "loading config");
    manager.load()
}

/// Resolve the endpoint and build an S3 client
pub(crate) async fn connect(config: &Config) -> sup_core::Result<S3Client> {
    let endpoint = EndpointConfig::resolve(config)?;
    S3Client::new(endpoint).await
}

/// Load the config and connect, reporting failures through `formatter`
pub(crate) async fn setup(
    config_path: Option<&Path>,
    formatter: &Formatter,
) -> Result<(Config, S3Client), ExitCode> {
    let config = load_config(config_path).map_err(|e| {
        formatter.error(&format!("Failed to load configuration: {e}"));
        ExitCode::from_error(&e)
    })?;

    let client = connect(&config).await.map_err(|e| {
        formatter.error(&format!("Failed to create S3 client: {e}"));
        ExitCode::from_error(&e)
    })?;

    Ok((config, client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload_flags() {
        let cli = Cli::parse_from([
            "sup",
            "--json",
            "upload",
            "--bucket",
            "photos",
            "--files",
            "data",
            "--key-mode",
            "relative-path",
            "--exclude",
            "*.tmp",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(args.bucket.as_deref(), Some("photos"));
                assert_eq!(args.files, Some(PathBuf::from("data")));
                assert_eq!(args.key_mode, Some(sup_core::KeyMode::RelativePath));
                assert_eq!(args.exclude, vec!["*.tmp"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_only_upload_mb_and_ls_are_commands() {
        let names: Vec<_> = Cli::command()
            .get_subcommands()
            .map(|c| c.get_name().to_string())
            .collect();
        for expected in ["upload", "mb", "ls"] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert!(!names.iter().any(|n| n == "completions"));
        assert!(Cli::try_parse_from(["sup", "completions", "bash"]).is_err());
    }

    #[test]
    fn test_load_config_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"bucket": "lod-demo", "files": "data"}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.bucket, "lod-demo");
    }
}
