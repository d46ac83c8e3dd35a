//! Configuration management for ofmdscan.
//!
//! Configuration is loaded with figment from defaults, an optional TOML file
//! and `OFMDSCAN_`-prefixed environment variables.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the user config dir.
const APP_DIR_NAME: &str = "ofmdscan";

/// Default read-chunk size (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Largest accepted read-chunk size (64 MiB).
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `OFMDSCAN_`)
/// 2. TOML config file at `~/.config/ofmdscan/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stream scanning configuration.
    pub scan: ScanConfig,
    /// Report and OFS output configuration.
    pub output: OutputConfig,
}

/// Scanner-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of bytes pulled from the input per read.
    pub chunk_size: usize,
    /// Print the progress percentage to stderr while scanning.
    pub show_progress: bool,
}

/// Output-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory OFS files are written to when none is given on the command line.
    pub directory: PathBuf,
    /// Report rendering.
    pub format: ReportFormat,
}

/// How a report is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Human-readable text blocks.
    #[default]
    Plain,
    /// Pretty-printed JSON.
    Json,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            show_progress: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            format: ReportFormat::Plain,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("OFMDSCAN_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.scan.chunk_size == 0 {
            return Err(Error::ConfigValidation {
                message: "chunk_size must be greater than 0".to_string(),
            });
        }

        if self.scan.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::ConfigValidation {
                message: format!(
                    "chunk_size ({}) cannot be greater than {MAX_CHUNK_SIZE}",
                    self.scan.chunk_size
                ),
            });
        }

        Ok(())
    }
}
