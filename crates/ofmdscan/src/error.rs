//! Error types for ofmdscan.
//!
//! This module defines all error types used throughout the ofmdscan crate.
//! Every variant here is fatal for a run; the only non-fatal condition, a
//! truncated candidate record, lives in [`crate::scanner::TruncatedRecord`].

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for ofmdscan operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// Failed to open the input stream.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Path to the input file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or seeking the input stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The scan finished without accepting a single OFMD record.
    #[error("no OFMD structures found in {path}")]
    MarkerNotFound {
        /// Path (or label) of the scanned stream.
        path: PathBuf,
    },

    // === Layout Errors ===
    /// Reconstruction was asked to work on zero records.
    #[error("no OFMD records to reconstruct planes from")]
    EmptyInput,

    /// The first record declares zero planes or zero frames.
    #[error("invalid OFMD layout: {plane_count} planes, {frame_count} frames per record")]
    InvalidLayout {
        /// Plane count read from byte 10.
        plane_count: u8,
        /// Frame count read from byte 11.
        frame_count: u8,
    },

    /// A later record declares a different frame count than record 0.
    #[error("OFMD record {record} has {found} frames, expected {expected}")]
    InconsistentLayout {
        /// Index of the offending record.
        record: usize,
        /// Frame count of record 0.
        expected: u8,
        /// Frame count of the offending record.
        found: u8,
    },

    /// A plane slice would read past the end of a record.
    #[error("plane {plane} of OFMD record {record} ends at byte {end}, record is {len} bytes")]
    BoundsError {
        /// Index of the offending record.
        record: usize,
        /// Plane whose slice overflows.
        plane: usize,
        /// Exclusive end offset of the slice.
        end: usize,
        /// Actual record length.
        len: usize,
    },

    // === Analysis Errors ===
    /// The frame-rate code has no nominal rate.
    #[error("unknown frame-rate code {0}")]
    UnknownFrameRate(u8),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// A command-line option is invalid or conflicts with another.
    #[error("invalid option: {message}")]
    InvalidOption {
        /// Description of the problem.
        message: String,
    },

    // === Output Errors ===
    /// Failed to create the output directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for ofmdscan operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid option error.
    #[must_use]
    pub fn invalid_option(message: impl Into<String>) -> Self {
        Self::InvalidOption {
            message: message.into(),
        }
    }

    /// Check if this error means the stream held no usable OFMD data.
    #[must_use]
    pub fn is_marker_not_found(&self) -> bool {
        matches!(self, Self::MarkerNotFound { .. })
    }

    /// Check if this error comes from the record layout rather than I/O.
    #[must_use]
    pub fn is_layout_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::InvalidLayout { .. }
                | Self::InconsistentLayout { .. }
                | Self::BoundsError { .. }
        )
    }
}
