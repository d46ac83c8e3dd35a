//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::config::ReportFormat;

/// Analyze command arguments.
#[derive(Debug, Args)]
pub struct AnalyzeCommand {
    /// Raw MVC/H.264 elementary stream (.mvc, .h264, .264, .m2ts)
    pub input: PathBuf,

    /// Output format (defaults to the configured one)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Extract command arguments.
#[derive(Debug, Args)]
pub struct ExtractCommand {
    /// Raw MVC/H.264 elementary stream (.mvc, .h264, .264, .m2ts)
    pub input: PathBuf,

    /// Folder the OFS files are written to (defaults to the configured one)
    pub output_dir: Option<PathBuf>,

    /// Override the stream's frame-rate code: 1=23.976 2=24 3=25 4=29.97 6=50 7=60
    #[arg(long, value_name = "CODE", value_parser = clap::value_parser!(u8).range(1..=7))]
    pub fps: Option<u8>,

    /// Set drop_frame_flag in the OFS files (only with a 29.97 rate)
    #[arg(long)]
    pub drop_frame: bool,

    /// Output format (defaults to the configured one)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Plain => Self::Plain,
            OutputFormat::Json => Self::Json,
        }
    }
}
