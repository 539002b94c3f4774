//! Integration tests for the sup CLI
//!
//! These tests require a running S3-compatible server.
//!
//! Run with:
//! ```bash
//! # Start RustFS container
//! docker run -d --name rustfs -p 9000:9000 \
//!     -e RUSTFS_ACCESS_KEY=accesskey \
//!     -e RUSTFS_SECRET_KEY=secretkey \
//!     rustfs/rustfs:1.0.0-alpha.81
//!
//! # Run tests
//! TEST_S3_ENDPOINT=http://localhost:9000 \
//! TEST_S3_ACCESS_KEY=accesskey \
//! TEST_S3_SECRET_KEY=secretkey \
//!     cargo test --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

use tempfile::TempDir;

/// Get S3 test configuration from environment
fn get_test_config() -> Option<(String, String, String)> {
    let endpoint = std::env::var("TEST_S3_ENDPOINT").ok()?;
    let access_key = std::env::var("TEST_S3_ACCESS_KEY").ok()?;
    let secret_key = std::env::var("TEST_S3_SECRET_KEY").ok()?;
    Some((endpoint, access_key, secret_key))
}

/// A scratch directory holding a config file and a files root
struct Workspace {
    dir: TempDir,
    bucket: String,
}

impl Workspace {
    fn new(name: &str) -> Option<Self> {
        let (endpoint, access_key, secret_key) = get_test_config()?;
        let dir = tempfile::tempdir().ok()?;
        let bucket = format!("test-{}-{}", name, uuid_suffix());

        let config = format!(
            r#"bucket = "{bucket}"
files = "{files}"

[endpoint]
url = "{endpoint}"
access_key = "{access_key}"
secret_key = "{secret_key}"
bucket_lookup = "path"
"#,
            files = dir.path().join("data").display(),
        );
        std::fs::create_dir_all(dir.path().join("data")).ok()?;
        std::fs::write(dir.path().join("config.toml"), config).ok()?;

        let workspace = Self { dir, bucket };
        if !workspace.wait_for_s3_ready() {
            eprintln!("S3 service did not become ready in time");
            return None;
        }
        Some(workspace)
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn files_root(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn write(&self, relative: &str, content: &[u8]) {
        let path = self.files_root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn run(&self, args: &[&str]) -> Output {
        run_sup(args, &self.config_path())
    }

    fn wait_for_s3_ready(&self) -> bool {
        for _ in 0..30 {
            if self.run(&["ls", "--json"]).status.success() {
                return true;
            }
            std::thread::sleep(Duration::from_secs(1));
        }
        false
    }
}

/// Run sup with an isolated config file and no inherited overrides
fn run_sup(args: &[&str], config: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sup"))
        .args(args)
        .arg("--config")
        .arg(config)
        .arg("--no-color")
        .env_remove("SUP_BUCKET")
        .env_remove("SUP_FILES")
        .output()
        .expect("Failed to execute sup command")
}

fn uuid_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{:x}", duration.as_nanos() % 0xFFFFFFFF)
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("Invalid JSON output")
}

macro_rules! workspace_or_skip {
    ($name:expr) => {
        match Workspace::new($name) {
            Some(w) => w,
            None => {
                eprintln!("Skipping: S3 test config not available");
                return;
            }
        }
    };
}

mod bucket_operations {
    use super::*;

    #[test]
    fn test_make_bucket_from_config() {
        let ws = workspace_or_skip!("mb");

        let output = ws.run(&["mb", "--json"]);
        assert!(
            output.status.success(),
            "Failed to create bucket: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let json = stdout_json(&output);
        assert_eq!(json["status"], "success");
        assert_eq!(json["bucket"], ws.bucket.as_str());

        // Second create conflicts unless told to ignore it
        let output = ws.run(&["mb"]);
        assert_eq!(output.status.code(), Some(6));

        let output = ws.run(&["mb", "--ignore-existing", "--json"]);
        assert!(output.status.success());
        assert_eq!(stdout_json(&output)["message"], "Bucket already exists");

        let output = ws.run(&["ls", "--json"]);
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains(&ws.bucket), "Bucket not found in listing");
    }
}

mod upload_operations {
    use super::*;

    #[test]
    fn test_upload_with_sidecars() {
        let ws = workspace_or_skip!("upload");
        ws.write("photo.jpg", b"\xff\xd8\xff\xe0jpeg");
        ws.write("photo.JSON", br#"{"type": "image", "camera": "x100"}"#);
        ws.write("note.txt", b"hello");
        ws.write("nested/clip.mp4", b"0000ftypmp42");
        ws.write("nested/clip.json", br#"{"type": "video"}"#);

        let output = ws.run(&["upload", "--create-bucket", "--json"]);
        assert!(
            output.status.success(),
            "Upload failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let json = stdout_json(&output);
        assert_eq!(json["bucket"], ws.bucket.as_str());
        assert_eq!(json["count"], 3);
        assert_eq!(json["skipped"].as_array().map(Vec::len), Some(0));

        let objects = json["objects"].as_array().unwrap();
        let find = |key: &str| {
            objects
                .iter()
                .find(|o| o["key"] == key)
                .unwrap_or_else(|| panic!("{key} missing from inventory"))
        };
        assert_eq!(find("clip.mp4")["type"], "video");
        assert_eq!(find("photo.jpg")["type"], "image");
        assert_eq!(find("photo.jpg")["size"], 8);
        assert_eq!(find("note.txt")["type"], "");
        assert!(objects.iter().all(|o| !o["key"].as_str().unwrap().ends_with(".json")));
        assert!(objects.iter().all(|o| !o["key"].as_str().unwrap().ends_with(".JSON")));

        // Sidecars are never stored as objects
        let output = ws.run(&["ls", &ws.bucket, "--json"]);
        assert!(output.status.success());
        let listing = stdout_json(&output);
        let keys: Vec<&str> = listing["items"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|i| i["key"].as_str())
            .collect();
        assert_eq!(keys.len(), 3, "unexpected keys: {keys:?}");
    }

    #[test]
    fn test_upload_relative_keys() {
        let ws = workspace_or_skip!("relative");
        ws.write("a/same.txt", b"one");
        ws.write("b/same.txt", b"two");

        let output = ws.run(&[
            "upload",
            "--create-bucket",
            "--key-mode",
            "relative-path",
            "--json",
        ]);
        assert!(output.status.success());

        let json = stdout_json(&output);
        let keys: Vec<&str> = json["objects"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|o| o["key"].as_str())
            .collect();
        assert_eq!(keys, vec!["a/same.txt", "b/same.txt"]);
    }

    #[test]
    fn test_upload_human_output() {
        let ws = workspace_or_skip!("table");
        ws.write("photo.jpg", b"jpeg");

        let output = ws.run(&["upload", "--create-bucket", "--no-progress"]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("photo.jpg"));
        assert!(stdout.contains("Objects: 1"));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn test_upload_missing_root() {
        let ws = workspace_or_skip!("missing");
        let missing = ws.dir.path().join("does-not-exist");
        let missing = missing.to_string_lossy();

        let output = ws.run(&["upload", "--create-bucket", "--files", &missing, "--json"]);
        assert!(!output.status.success());

        let json = stdout_json(&output);
        assert_eq!(json["count"], 0);
    }

    #[test]
    fn test_upload_without_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "files = \"data\"\n").unwrap();

        let output = run_sup(&["upload"], &config);
        assert_eq!(output.status.code(), Some(2));
    }
}
