//! `ofmdscan` - Offset-metadata extraction and 3D-plane checks for MVC streams
//!
//! This library locates the OFMD structures embedded in a raw stereoscopic
//! elementary stream, rebuilds the per-plane depth timelines they carry, and
//! computes the statistics used to sanity-check the encoded 3D depth data.
//! The analyzed planes can be written out as OFS files.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod ofs;
pub mod pipeline;
pub mod planes;
pub mod record;
pub mod report;
pub mod scanner;

pub use analyzer::{FrameRate, PlaneAnalyzer, PlaneReport, PlaneState, PlaneStats, Report};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use pipeline::{analyze_file, analyze_reader, Analysis};
pub use planes::{Dataset, PlaneReconstructor};
pub use record::RawRecord;
pub use scanner::{MarkerScanner, ScanOutcome, TruncatedRecord};
