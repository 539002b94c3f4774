//! sup - sidecar uploader
//!
//! Uploads a directory tree to an S3-compatible bucket, attaching metadata
//! from per-file sidecar JSON documents.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sidecar_uploader::commands::{self, Cli};
use sidecar_uploader::exit_code::ExitCode;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = tokio::select! {
        code = commands::execute(cli) => code,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted");
            ExitCode::Interrupted
        }
    };

    std::process::exit(exit_code.as_i32());
}
