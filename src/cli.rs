//! Command-line argument parsing
//!
//! Supports:
//! - Opening files as the workspace, with one of them focused
//! - Filtering by a query and printing ranked rows (text or JSON)
//! - Selecting a row to print its navigation target

use clap::Parser;
use std::path::PathBuf;

/// Search symbols across open JavaScript and CSS files
#[derive(Parser, Debug)]
#[command(
    name = "outline-quick-open",
    version,
    about = "Search symbols across open JavaScript and CSS files"
)]
pub struct CliArgs {
    /// Files to open
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// File that has focus (defaults to the first file)
    #[arg(long, value_name = "FILE")]
    pub focus: Option<PathBuf>,

    /// Filter query, e.g. `render` or `render(a`
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Select the Nth row (1-based) and print where it navigates to
    #[arg(long, value_name = "N")]
    pub select: Option<usize>,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,

    /// Per-file outline timeout in milliseconds (0 disables)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum rows to print
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the effective settings to the default config file
    #[arg(long)]
    pub save_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Files to open, in order
    pub files: Vec<PathBuf>,
    /// Index into `files` of the focused file
    pub focus_index: usize,
    pub query: String,
    /// Row to select, 0-indexed
    pub selection: Option<usize>,
    pub output: OutputFormat,
    pub timeout_ms: Option<u64>,
    pub limit: Option<usize>,
    pub config_path: Option<PathBuf>,
    pub save_config: bool,
}

impl CliArgs {
    /// Convert parsed CLI args into a run configuration
    pub fn into_config(self) -> Result<RunConfig, String> {
        let mut files = self.files;

        // A focused file that was not listed is opened too
        let focus_index = match self.focus {
            Some(focus) => match files.iter().position(|path| *path == focus) {
                Some(index) => index,
                None => {
                    files.push(focus);
                    files.len() - 1
                }
            },
            None => 0,
        };

        if files.is_empty() {
            return Err("No files to open".to_string());
        }

        // Convert from 1-indexed (user input) to 0-indexed (internal)
        let selection = match self.select {
            Some(0) => return Err("--select counts rows from 1".to_string()),
            Some(row) => Some(row - 1),
            None => None,
        };

        Ok(RunConfig {
            files,
            focus_index,
            query: self.query,
            selection,
            output: if self.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            timeout_ms: self.timeout_ms,
            limit: self.limit,
            config_path: self.config,
            save_config: self.save_config,
        })
    }
}
