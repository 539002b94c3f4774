//! sup CLI library
//!
//! Command definitions, exit codes and output formatting. The `sup` binary
//! parses arguments and hands them to [`commands::execute`].

pub mod commands;
pub mod exit_code;
pub mod output;
