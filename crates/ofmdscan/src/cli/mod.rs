//! Command-line interface for ofmdscan.
//!
//! This module provides the CLI structure for the `ofmdscan` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{AnalyzeCommand, ConfigCommand, ExtractCommand, OutputFormat};

/// ofmdscan - Check and extract 3D-Planes from MVC streams
///
/// Finds the offset metadata (OFMD) embedded in a raw MVC/H.264 stream,
/// reports per-plane depth statistics and writes OFS files.
#[derive(Debug, Parser)]
#[command(name = "ofmdscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report per-plane depth statistics
    Analyze(AnalyzeCommand),

    /// Report statistics and write one OFS file per non-empty plane
    Extract(ExtractCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn analyze(input: &str) -> Command {
        Command::Analyze(AnalyzeCommand {
            input: PathBuf::from(input),
            format: None,
        })
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "ofmdscan");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let mut cli = Cli {
            config: None,
            verbose: 0,
            quiet: true,
            command: analyze("a.mvc"),
        };
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Quiet);

        cli.quiet = false;
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Normal);
        cli.verbose = 1;
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Verbose);
        cli.verbose = 3;
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["ofmdscan", "analyze", "movie.mvc", "-f", "json"]).unwrap();
        match cli.command {
            Command::Analyze(cmd) => {
                assert_eq!(cmd.input, PathBuf::from("movie.mvc"));
                assert_eq!(cmd.format, Some(OutputFormat::Json));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_extract_with_options() {
        let args = [
            "ofmdscan",
            "extract",
            "movie.h264",
            "out",
            "--fps",
            "4",
            "--drop-frame",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Extract(cmd) => {
                assert_eq!(cmd.output_dir, Some(PathBuf::from("out")));
                assert_eq!(cmd.fps, Some(4));
                assert!(cmd.drop_frame);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_extract_rejects_out_of_range_fps() {
        assert!(Cli::try_parse_from(["ofmdscan", "extract", "movie.mvc", "--fps", "9"]).is_err());
    }

    #[test]
    fn test_parse_requires_input() {
        assert!(Cli::try_parse_from(["ofmdscan", "analyze"]).is_err());
    }

    #[test]
    fn test_parse_with_config_and_verbose() {
        let cli =
            Cli::try_parse_from(["ofmdscan", "-c", "/custom/config.toml", "-vv", "config", "path"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }
}
