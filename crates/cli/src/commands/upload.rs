//! upload command - Upload a files root with sidecar metadata
//!
//! Walks the files root, uploads every payload with the key/value pairs from
//! its sidecar as object metadata, verifies each object with a head request,
//! and prints the resulting inventory.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Args;
use sup_core::{
    Config, FileError, Inventory, KeyMode, ObjectStore, UploadObserver, UploadRecord, Uploader,
};

use crate::exit_code::ExitCode;
use crate::output::{
    render_table, Formatter, OutputConfig, ProgressBar, SkippedFile, UploadReport,
};

/// Upload a directory tree
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Target bucket (overrides the config file)
    #[arg(short, long, env = "SUP_BUCKET")]
    pub bucket: Option<String>,

    /// Files root to upload (overrides the config file)
    #[arg(short, long, env = "SUP_FILES")]
    pub files: Option<PathBuf>,

    /// Sidecar file extension, matched case-insensitively
    #[arg(long, value_name = "EXT")]
    pub sidecar_ext: Option<String>,

    /// How object keys are derived: file-name or relative-path
    #[arg(long, value_name = "MODE")]
    pub key_mode: Option<KeyMode>,

    /// Skip payloads whose file name matches this glob (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Create the bucket first if it does not exist
    #[arg(long)]
    pub create_bucket: bool,
}

impl UploadArgs {
    /// Layer command-line values over the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(bucket) = &self.bucket {
            config.bucket = bucket.clone();
        }
        if let Some(files) = &self.files {
            config.files = files.clone();
        }
        if let Some(ext) = &self.sidecar_ext {
            config.sidecar_extension = ext.clone();
        }
        if let Some(mode) = self.key_mode {
            config.key_mode = mode;
        }
        config.exclude.extend(self.exclude.iter().cloned());
    }
}

/// Drives the spinner and collects skipped payloads for the report
struct CliObserver {
    formatter: Formatter,
    progress: ProgressBar,
    skipped: Mutex<Vec<SkippedFile>>,
}

impl CliObserver {
    fn new(formatter: Formatter) -> Self {
        let progress = ProgressBar::spinner(formatter.config(), "Scanning files...");
        Self {
            formatter,
            progress,
            skipped: Mutex::new(Vec::new()),
        }
    }

    fn finish(self) -> Vec<SkippedFile> {
        self.progress.finish_and_clear();
        self.skipped.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl UploadObserver for CliObserver {
    fn on_start(&self, path: &Path) {
        self.progress.set_message(&format!("Uploading {}", path.display()));
    }

    fn on_uploaded(&self, _record: &UploadRecord) {
        self.progress.inc(1);
    }

    fn on_skipped(&self, path: &Path, error: &FileError) {
        self.progress
            .suspend(|| self.formatter.warning(&error.to_string()));
        let mut skipped = self.skipped.lock().unwrap_or_else(|e| e.into_inner());
        skipped.push(SkippedFile {
            path: path.display().to_string(),
            error: error.to_string(),
        });
    }
}

/// Execute the upload command
pub async fn execute(
    args: UploadArgs,
    config_path: Option<&Path>,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let mut config = match super::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from_error(&e);
        }
    };
    args.apply(&mut config);

    if let Err(e) = config.validate() {
        formatter.error(&e.to_string());
        return ExitCode::UsageError;
    }

    let client = match super::connect(&config).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    if args.create_bucket {
        if let Err(code) = ensure_bucket(&client, &config.bucket, &formatter).await {
            return code;
        }
    }

    let uploader = match Uploader::from_config(client, &config) {
        Ok(u) => u,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    tracing::info!(
        bucket = %config.bucket,
        root = %config.files.display(),
        "starting upload"
    );

    let mut inventory = Inventory::new();
    let observer = CliObserver::new(formatter.clone());
    let outcome = uploader
        .upload_tree(&config.files, &mut inventory, &observer)
        .await;
    let skipped = observer.finish();

    print_report(&formatter, &config.bucket, &inventory, skipped);

    match outcome {
        Ok(stats) if stats.failed > 0 => {
            formatter.warning(&format!(
                "{} of {} files were not uploaded",
                stats.failed, stats.payloads
            ));
            ExitCode::GeneralError
        }
        Ok(stats) => {
            tracing::debug!(?stats, "upload finished");
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

async fn ensure_bucket(
    client: &impl ObjectStore,
    bucket: &str,
    formatter: &Formatter,
) -> Result<(), ExitCode> {
    match client.bucket_exists(bucket).await {
        Ok(true) => Ok(()),
        Ok(false) => match client.create_bucket(bucket).await {
            Ok(()) => {
                formatter.success(&format!("Bucket '{bucket}' created."));
                Ok(())
            }
            Err(e) => {
                formatter.error(&format!("Failed to create bucket: {e}"));
                Err(ExitCode::from_error(&e))
            }
        },
        Err(e) => {
            formatter.error(&format!("Failed to check bucket existence: {e}"));
            Err(ExitCode::from_error(&e))
        }
    }
}

fn print_report(
    formatter: &Formatter,
    bucket: &str,
    inventory: &Inventory,
    skipped: Vec<SkippedFile>,
) {
    if formatter.is_json() {
        formatter.json(&UploadReport::new(bucket, inventory, skipped));
    } else {
        formatter.println(&render_table(inventory));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> UploadArgs {
        UploadArgs {
            bucket: None,
            files: None,
            sidecar_ext: None,
            key_mode: None,
            exclude: Vec::new(),
            create_bucket: false,
        }
    }

    #[test]
    fn test_apply_keeps_config_without_overrides() {
        let mut config = Config {
            bucket: "from-config".into(),
            files: PathBuf::from("data"),
            ..Default::default()
        };
        args().apply(&mut config);
        assert_eq!(config.bucket, "from-config");
        assert_eq!(config.files, PathBuf::from("data"));
        assert_eq!(config.key_mode, KeyMode::FileName);
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config {
            bucket: "from-config".into(),
            exclude: vec!["*.tmp".into()],
            ..Default::default()
        };
        let args = UploadArgs {
            bucket: Some("from-flag".into()),
            files: Some(PathBuf::from("/srv/media")),
            sidecar_ext: Some(".meta".into()),
            key_mode: Some(KeyMode::RelativePath),
            exclude: vec!["*.bak".into()],
            create_bucket: false,
        };
        args.apply(&mut config);

        assert_eq!(config.bucket, "from-flag");
        assert_eq!(config.files, PathBuf::from("/srv/media"));
        assert_eq!(config.sidecar_extension(), "meta");
        assert_eq!(config.key_mode, KeyMode::RelativePath);
        assert_eq!(config.exclude, vec!["*.tmp", "*.bak"]);
    }

    #[test]
    fn test_observer_collects_skipped() {
        let formatter = Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        });
        let observer = CliObserver::new(formatter);
        let error = FileError::Open {
            path: PathBuf::from("data/locked.bin"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        observer.on_start(Path::new("data/locked.bin"));
        observer.on_skipped(Path::new("data/locked.bin"), &error);

        let skipped = observer.finish();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].path, "data/locked.bin");
        assert!(skipped[0].error.contains("locked.bin"));
    }
}
