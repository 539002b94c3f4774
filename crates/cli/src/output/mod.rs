//! Output formatting utilities
//!
//! This module provides formatters for CLI output in both human-readable
//! and JSON formats, the upload report, and the progress spinner.

mod formatter;
mod progress;
mod report;

pub use formatter::Formatter;
pub use progress::ProgressBar;
pub use report::{render_table, SkippedFile, UploadReport};

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress spinner
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
