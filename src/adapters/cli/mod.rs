//! CLI Adapter
//!
//! Command-line interface for the mint watcher.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{ChatIdCmd, CheckConfigCmd, CliApp, Command, RunCmd, DEFAULT_CONFIG_PATH};

/// Parse the process arguments
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
