//! The scan → reconstruct → analyze pipeline.
//!
//! Any stage failing aborts the whole run; no partial analysis is returned.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::analyzer::{PlaneAnalyzer, Report};
use crate::error::{Error, Result};
use crate::planes::{Dataset, PlaneReconstructor};
use crate::scanner::{remaining_len, MarkerScanner, ScanOutcome, TruncatedRecord};

/// Input file extensions the tool accepts (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["mvc", "h264", "264", "m2ts"];

/// Scan diagnostics carried alongside the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    /// Accepted records.
    pub records: usize,
    /// Candidates rejected by the frame-rate plausibility check.
    pub rejected_candidates: usize,
    /// Candidates dropped for running past the end of the stream.
    pub truncated_records: Vec<TruncatedRecord>,
    /// Bytes read from the input.
    pub bytes_scanned: u64,
}

impl From<&ScanOutcome> for ScanSummary {
    fn from(outcome: &ScanOutcome) -> Self {
        Self {
            records: outcome.records.len(),
            rejected_candidates: outcome.rejected,
            truncated_records: outcome.truncated.clone(),
            bytes_scanned: outcome.bytes_scanned,
        }
    }
}

/// Result of a complete run over one input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// The input that was scanned.
    pub input: PathBuf,
    /// Scan diagnostics.
    pub scan: ScanSummary,
    /// Per-plane report.
    pub report: Report,
    /// Reconstructed timelines, empty planes cleared.
    #[serde(skip)]
    pub dataset: Dataset,
}

/// Expand a leading `~` and check the file extension.
///
/// # Errors
///
/// Returns [`Error::InvalidOption`] if the extension isn't one of
/// [`SUPPORTED_EXTENSIONS`].
pub fn resolve_input(path: &Path) -> Result<PathBuf> {
    let path = expand_home(path);
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        });
    if !supported {
        return Err(Error::invalid_option(format!(
            "'{}' is not a supported input, expected one of: {}",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }
    Ok(path)
}

/// Replace a leading `~` component with the user's home directory.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

/// Run the pipeline over a file.
///
/// # Errors
///
/// Returns [`Error::Open`] if the file can't be opened, and any error of the
/// individual stages.
pub fn analyze_file<F>(path: &Path, scanner: &MarkerScanner, progress: F) -> Result<Analysis>
where
    F: FnMut(u8),
{
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    analyze_reader(BufReader::new(file), path, scanner, progress)
}

/// Run the pipeline over any seekable source; `label` names it in errors.
///
/// # Errors
///
/// - [`Error::Io`] if reading fails.
/// - [`Error::MarkerNotFound`] if no record was accepted.
/// - Layout and frame-rate errors from reconstruction and analysis.
pub fn analyze_reader<R, F>(
    mut source: R,
    label: &Path,
    scanner: &MarkerScanner,
    progress: F,
) -> Result<Analysis>
where
    R: Read + Seek,
    F: FnMut(u8),
{
    let start = source.stream_position()?;
    let total_len = remaining_len(&mut source)?;
    info!(input = %label.display(), bytes = total_len, "Scanning for OFMD records");

    let outcome = scanner.scan_from(source, start, total_len, progress)?;
    if outcome.records.is_empty() {
        return Err(Error::MarkerNotFound {
            path: label.to_path_buf(),
        });
    }
    let scan = ScanSummary::from(&outcome);

    let mut dataset = PlaneReconstructor.reconstruct(&outcome.records)?;
    let report = PlaneAnalyzer.analyze(&mut dataset)?;

    Ok(Analysis {
        input: label.to_path_buf(),
        scan,
        report,
        dataset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MARKER, RECORD_LEN};
    use std::io::Cursor;

    fn stream(rate: u8, records: usize) -> Vec<u8> {
        let mut data = vec![0u8; 33];
        for _ in 0..records {
            let mut bytes = vec![0u8; RECORD_LEN];
            bytes[..4].copy_from_slice(MARKER);
            bytes[4] = rate;
            bytes[10] = 2;
            bytes[11] = 2;
            bytes[14..18].copy_from_slice(&[0x80, 0x80, 3, 4]);
            data.extend(bytes);
        }
        data
    }

    #[test]
    fn test_analyze_reader() {
        crate::logging::init_test_logging();
        let analysis = analyze_reader(
            Cursor::new(stream(2, 3)),
            Path::new("mem.mvc"),
            &MarkerScanner::new(1000),
            |_| {},
        )
        .unwrap();

        assert_eq!(analysis.scan.records, 3);
        assert_eq!(analysis.report.total_frames, 6);
        assert!(analysis.report.planes[0].is_empty());
        assert_eq!(analysis.dataset.planes[1], vec![3, 4, 3, 4, 3, 4]);
    }

    #[test]
    fn test_no_records_is_marker_not_found() {
        let err = analyze_reader(
            Cursor::new(vec![0u8; 10_000]),
            Path::new("blank.h264"),
            &MarkerScanner::default(),
            |_| {},
        )
        .unwrap_err();
        assert!(err.is_marker_not_found());
    }

    #[test]
    fn test_only_truncated_records_is_marker_not_found() {
        crate::logging::init_test_logging();
        let mut data = vec![0u8; 10];
        data.extend(b"OFMD\x01");
        let err = analyze_reader(
            Cursor::new(data),
            Path::new("short.mvc"),
            &MarkerScanner::default(),
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, Error::MarkerNotFound { .. }));
    }

    #[test]
    fn test_code_five_is_unknown_frame_rate() {
        let err = analyze_reader(
            Cursor::new(stream(5, 1)),
            Path::new("five.mvc"),
            &MarkerScanner::default(),
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownFrameRate(5)));
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let err = analyze_file(
            Path::new("/nonexistent/movie.mvc"),
            &MarkerScanner::default(),
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
    }

    #[test]
    fn test_resolve_input_extensions() {
        assert!(resolve_input(Path::new("/a/movie.mvc")).is_ok());
        assert!(resolve_input(Path::new("/a/movie.H264")).is_ok());
        assert!(resolve_input(Path::new("/a/00001.M2TS")).is_ok());
        assert!(matches!(
            resolve_input(Path::new("/a/movie.mkv")),
            Err(Error::InvalidOption { .. })
        ));
        assert!(resolve_input(Path::new("/a/movie")).is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(
            expand_home(Path::new("/abs/movie.mvc")),
            PathBuf::from("/abs/movie.mvc")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home(Path::new("~/movie.mvc")),
                home.join("movie.mvc")
            );
        }
    }
}
