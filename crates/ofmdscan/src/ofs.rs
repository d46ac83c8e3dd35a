//! OFS ("offset sequence") file output.
//!
//! One file per analyzed plane, named `3D-Plane-NN.ofs`:
//!
//! ```text
//! 0   8  signature     89 4F 46 53 0D 0A 1A 0A
//! 8   4  version       "0100"
//! 12  16 GUID          15 bytes derived from the input name, then the plane number
//! 28  1  frame rate    code << 4 | drop_frame_flag
//! 29  4  rolls etc.    01 00 00 00
//! 33  4  timecode      00 00 00 00
//! 37  4  frame count   big endian
//! 41  n  depth bytes
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::analyzer::{FrameRate, Report};
use crate::error::{Error, Result};
use crate::planes::Dataset;

/// File signature.
pub const SIGNATURE: [u8; 8] = [0x89, b'O', b'F', b'S', 0x0D, 0x0A, 0x1A, 0x0A];

/// Format version string.
pub const VERSION: [u8; 4] = *b"0100";

/// Bytes before the first depth sample.
pub const HEADER_LEN: usize = 41;

const ROLLS_AND_RESERVED: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
const START_TIMECODE: [u8; 4] = [0; 4];

/// Frame-rate settings written into every OFS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfsOptions {
    frame_rate: FrameRate,
    drop_frame: bool,
}

impl OfsOptions {
    /// Options for `frame_rate`, optionally setting the drop-frame flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if `drop_frame` is requested for any
    /// rate other than 29.97.
    pub fn new(frame_rate: FrameRate, drop_frame: bool) -> Result<Self> {
        if drop_frame && frame_rate != FrameRate::Ntsc {
            return Err(Error::invalid_option(format!(
                "drop-frame is only compatible with frame-rate code 4, not {}",
                frame_rate.code()
            )));
        }
        Ok(Self {
            frame_rate,
            drop_frame,
        })
    }

    /// Resolve an optional frame-rate override against the stream's own rate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] for an override code without a nominal
    /// rate, or for a drop-frame request the resulting rate can't carry.
    pub fn resolve(
        stream_rate: FrameRate,
        fps_override: Option<u8>,
        drop_frame: bool,
    ) -> Result<Self> {
        let frame_rate = match fps_override {
            Some(code) => FrameRate::from_code(code).map_err(|_| {
                Error::invalid_option(format!(
                    "frame-rate code {code} is invalid, expected one of 1, 2, 3, 4, 6, 7"
                ))
            })?,
            None => stream_rate,
        };
        Self::new(frame_rate, drop_frame)
    }

    /// Frame rate written to the header.
    #[must_use]
    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// The header's frame-rate byte.
    #[must_use]
    pub fn frame_rate_byte(&self) -> u8 {
        (self.frame_rate.code() << 4) | u8::from(self.drop_frame)
    }
}

/// Derive the shared part of the plane GUIDs from the input file name.
#[must_use]
pub fn guid_seed(input_name: &str) -> [u8; 15] {
    let hash = blake3::hash(input_name.as_bytes());
    let mut seed = [0u8; 15];
    seed.copy_from_slice(&hash.as_bytes()[..15]);
    seed
}

/// Serialize one plane as an OFS file image.
#[must_use]
pub fn encode(plane: u8, timeline: &[u8], options: OfsOptions, seed: &[u8; 15]) -> Vec<u8> {
    let frames = u32::try_from(timeline.len()).unwrap_or(u32::MAX);

    let mut out = Vec::with_capacity(HEADER_LEN + timeline.len());
    out.extend_from_slice(&SIGNATURE);
    out.extend_from_slice(&VERSION);
    out.extend_from_slice(seed);
    out.push(plane);
    out.push(options.frame_rate_byte());
    out.extend_from_slice(&ROLLS_AND_RESERVED);
    out.extend_from_slice(&START_TIMECODE);
    out.extend_from_slice(&frames.to_be_bytes());
    out.extend_from_slice(timeline);
    out
}

/// File name used for plane `plane`.
#[must_use]
pub fn file_name(plane: usize) -> String {
    format!("3D-Plane-{plane:02}.ofs")
}

/// Writes OFS files for the analyzed planes of a dataset.
#[derive(Debug, Clone)]
pub struct OfsWriter {
    directory: PathBuf,
    seed: [u8; 15],
}

impl OfsWriter {
    /// Create a writer targeting `directory`, with GUIDs seeded by `input`'s file name.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, input: &Path) -> Self {
        let name = input
            .file_name()
            .map_or_else(|| input.to_string_lossy(), |n| n.to_string_lossy());
        Self {
            directory: directory.into(),
            seed: guid_seed(&name),
        }
    }

    /// Output directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write one file per analyzed plane and return their paths in plane order.
    ///
    /// The output directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory can't be created or a file can't be written.
    pub fn write(
        &self,
        dataset: &Dataset,
        report: &Report,
        options: OfsOptions,
    ) -> Result<Vec<PathBuf>> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory).map_err(|source| Error::DirectoryCreate {
                path: self.directory.clone(),
                source,
            })?;
        }

        let mut written = Vec::new();
        for index in report.analyzed_indices() {
            let Some(timeline) = dataset.planes.get(index) else {
                continue;
            };
            // Plane counts come from a 7-bit field
            let plane = u8::try_from(index).unwrap_or(u8::MAX);
            let path = self.directory.join(file_name(index));
            fs::write(&path, encode(plane, timeline, options, &self.seed))?;
            debug!(plane = index, path = %path.display(), "Wrote OFS file");
            written.push(path);
        }

        info!(
            files = written.len(),
            directory = %self.directory.display(),
            "OFS files written"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::PlaneAnalyzer;
    use crate::planes::SENTINEL;

    #[test]
    fn test_options_drop_frame_needs_ntsc() {
        assert!(OfsOptions::new(FrameRate::Ntsc, true).is_ok());
        let err = OfsOptions::new(FrameRate::Fps24, true).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { .. }));
        assert!(OfsOptions::new(FrameRate::Fps24, false).is_ok());
    }

    #[test]
    fn test_resolve_override() {
        let options = OfsOptions::resolve(FrameRate::Film, Some(4), true).unwrap();
        assert_eq!(options.frame_rate(), FrameRate::Ntsc);
        assert_eq!(options.frame_rate_byte(), 0x41);

        let options = OfsOptions::resolve(FrameRate::Fps50, None, false).unwrap();
        assert_eq!(options.frame_rate_byte(), 0x60);

        let err = OfsOptions::resolve(FrameRate::Film, Some(5), false).unwrap_err();
        assert!(err.to_string().contains("frame-rate code 5"));
    }

    #[test]
    fn test_encode_layout() {
        let options = OfsOptions::new(FrameRate::Fps24, false).unwrap();
        let seed = [0xAB; 15];
        let image = encode(3, &[1, 2, 0x80], options, &seed);

        assert_eq!(image.len(), HEADER_LEN + 3);
        assert_eq!(&image[0..8], &SIGNATURE);
        assert_eq!(&image[8..12], b"0100");
        assert_eq!(&image[12..27], &seed);
        assert_eq!(image[27], 3);
        assert_eq!(image[28], 0x20);
        assert_eq!(&image[29..33], &[1, 0, 0, 0]);
        assert_eq!(&image[33..37], &[0, 0, 0, 0]);
        assert_eq!(&image[37..41], &[0, 0, 0, 3]);
        assert_eq!(&image[41..], &[1, 2, 0x80]);
    }

    #[test]
    fn test_guid_seed_is_deterministic() {
        assert_eq!(guid_seed("movie.mvc"), guid_seed("movie.mvc"));
        assert_ne!(guid_seed("movie.mvc"), guid_seed("other.mvc"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(0), "3D-Plane-00.ofs");
        assert_eq!(file_name(31), "3D-Plane-31.ofs");
    }

    #[test]
    fn test_write_skips_empty_planes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ofs");
        let mut dataset = Dataset {
            frame_rate_code: 1,
            frames_per_record: 2,
            record_count: 1,
            planes: vec![vec![SENTINEL, SENTINEL], vec![5, 6]],
        };
        let report = PlaneAnalyzer.analyze(&mut dataset).unwrap();
        let options = OfsOptions::new(report.frame_rate, false).unwrap();

        let writer = OfsWriter::new(&out, Path::new("/videos/movie.mvc"));
        let written = writer.write(&dataset, &report, options).unwrap();

        assert_eq!(written, vec![out.join("3D-Plane-01.ofs")]);
        let image = fs::read(&written[0]).unwrap();
        assert_eq!(image.len(), HEADER_LEN + 2);
        assert_eq!(&image[12..27], &guid_seed("movie.mvc"));
        assert_eq!(image[27], 1);
        assert_eq!(image[28], 0x10);
        assert_eq!(&image[41..], &[5, 6]);
        assert!(!out.join("3D-Plane-00.ofs").exists());
    }
}
