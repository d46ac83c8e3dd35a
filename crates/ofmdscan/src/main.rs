//! `ofmdscan` - CLI for ofmdscan
//!
//! This binary scans an MVC elementary stream for 3D-Planes, prints the
//! per-plane report and optionally writes OFS files.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use clap::Parser;

use ofmdscan::cli::{AnalyzeCommand, Cli, Command, ConfigCommand, ExtractCommand};
use ofmdscan::config::ReportFormat;
use ofmdscan::ofs::{OfsOptions, OfsWriter};
use ofmdscan::{analyze_file, init_logging, pipeline, report, Analysis, Config, MarkerScanner};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;
    let show_progress = config.scan.show_progress && !cli.quiet;

    match cli.command {
        Command::Analyze(cmd) => handle_analyze(&config, &cmd, show_progress),
        Command::Extract(cmd) => handle_extract(&config, &cmd, show_progress),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn run_pipeline(config: &Config, input: &Path, show_progress: bool) -> anyhow::Result<Analysis> {
    let input = pipeline::resolve_input(input)?;
    let scanner = MarkerScanner::from_config(&config.scan);

    let mut last = None;
    let analysis = analyze_file(&input, &scanner, |percent| {
        if show_progress && last != Some(percent) {
            last = Some(percent);
            // Progress goes to stderr so the report can be piped
            eprint!("\rProgress: {percent}%");
            let _ = std::io::stderr().flush();
        }
    });
    if show_progress {
        eprintln!();
    }

    analysis.with_context(|| format!("failed to analyze {}", input.display()))
}

fn print_report(analysis: &Analysis, format: ReportFormat) -> anyhow::Result<()> {
    print!("{}", report::render(analysis, format)?);
    if format == ReportFormat::Json {
        println!();
    }
    Ok(())
}

fn handle_analyze(
    config: &Config,
    cmd: &AnalyzeCommand,
    show_progress: bool,
) -> anyhow::Result<()> {
    let analysis = run_pipeline(config, &cmd.input, show_progress)?;
    let format = cmd.format.map_or(config.output.format, ReportFormat::from);
    print_report(&analysis, format)
}

fn handle_extract(
    config: &Config,
    cmd: &ExtractCommand,
    show_progress: bool,
) -> anyhow::Result<()> {
    let analysis = run_pipeline(config, &cmd.input, show_progress)?;
    let options = OfsOptions::resolve(analysis.report.frame_rate, cmd.fps, cmd.drop_frame)?;

    let format = cmd.format.map_or(config.output.format, ReportFormat::from);
    print_report(&analysis, format)?;

    let directory = cmd
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.directory.clone());
    let writer = OfsWriter::new(pipeline::expand_home(&directory), &analysis.input);
    let written = writer
        .write(&analysis.dataset, &analysis.report, options)
        .with_context(|| format!("failed to write OFS files to {}", directory.display()))?;

    if format == ReportFormat::Plain {
        println!("Number of 3D-Planes written: {}", written.len());
        println!("OFS framerate: {}", options.frame_rate());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Scan]");
                println!("  Chunk size:         {}", config.scan.chunk_size);
                println!("  Show progress:      {}", config.scan.show_progress);
                println!();
                println!("[Output]");
                println!("  Directory:          {}", config.output.directory.display());
                println!("  Format:             {:?}", config.output.format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
