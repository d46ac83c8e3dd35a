//! Per-plane depth statistics.
//!
//! Each plane timeline is either all [`SENTINEL`] bytes, in which case it is
//! reported [`PlaneState::Empty`] and cleared from the dataset, or it gets a
//! full [`PlaneStats`] block.
//!
//! Raw bytes above 128 encode the negative side of the depth range and are
//! mapped to `128 - b`, so the defined values span `-127..=128`.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::planes::{Dataset, SENTINEL};

/// Nominal playback rate of the depth timelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameRate {
    /// 23.976 fps (code 1).
    Film,
    /// 24 fps (code 2).
    Fps24,
    /// 25 fps (code 3).
    Fps25,
    /// 29.97 fps (code 4).
    Ntsc,
    /// 50 fps (code 6).
    Fps50,
    /// 60 fps (code 7).
    Fps60,
}

impl FrameRate {
    /// Look up a frame-rate code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFrameRate`] for codes without a nominal rate,
    /// including 0 and 5.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::Film),
            2 => Ok(Self::Fps24),
            3 => Ok(Self::Fps25),
            4 => Ok(Self::Ntsc),
            6 => Ok(Self::Fps50),
            7 => Ok(Self::Fps60),
            other => Err(Error::UnknownFrameRate(other)),
        }
    }

    /// The 4-bit code used in OFMD and OFS headers.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Film => 1,
            Self::Fps24 => 2,
            Self::Fps25 => 3,
            Self::Ntsc => 4,
            Self::Fps50 => 6,
            Self::Fps60 => 7,
        }
    }

    /// Frames per second.
    #[must_use]
    pub fn fps(self) -> f64 {
        match self {
            Self::Film => 23.976,
            Self::Fps24 => 24.0,
            Self::Fps25 => 25.0,
            Self::Ntsc => 29.97,
            Self::Fps50 => 50.0,
            Self::Fps60 => 60.0,
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Film => write!(f, "23.976"),
            Self::Fps24 => write!(f, "24"),
            Self::Fps25 => write!(f, "25"),
            Self::Ntsc => write!(f, "29.97"),
            Self::Fps50 => write!(f, "50"),
            Self::Fps60 => write!(f, "60"),
        }
    }
}

/// Statistics of a plane with at least one defined sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneStats {
    /// Smallest transformed depth.
    pub min_depth: i16,
    /// Largest transformed depth.
    pub max_depth: i16,
    /// Mean transformed depth over defined samples, rounded to two decimals.
    pub average_depth: f64,
    /// One plus the number of adjacent raw-byte changes.
    pub cuts: usize,
    /// Index of the first defined sample.
    pub first_defined_index: usize,
    /// Index of the last defined sample.
    pub last_defined_index: usize,
    /// Number of sentinel samples.
    pub undefined_count: usize,
    /// Minimum and maximum depth are equal.
    pub degenerate: bool,
    /// Other planes whose timelines are byte-identical to this one.
    pub identical_planes: Vec<usize>,
}

/// Outcome of analyzing a single plane.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PlaneState {
    /// Every sample was the sentinel.
    Empty,
    /// At least one sample carried a depth.
    Analyzed(PlaneStats),
}

/// Report block for one plane.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneReport {
    /// Plane number.
    pub index: usize,
    /// Timeline length before any clearing.
    pub num_frames: usize,
    /// Empty or analyzed.
    #[serde(flatten)]
    pub state: PlaneState,
}

impl PlaneReport {
    /// Statistics, if the plane was analyzed.
    #[must_use]
    pub fn stats(&self) -> Option<&PlaneStats> {
        match &self.state {
            PlaneState::Analyzed(stats) => Some(stats),
            PlaneState::Empty => None,
        }
    }

    /// Check if the plane held no defined samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.state, PlaneState::Empty)
    }
}

/// File-level analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Nominal frame rate.
    pub frame_rate: FrameRate,
    /// The 4-bit code the rate was read from.
    pub frame_rate_code: u8,
    /// Frames per second, for scripting convenience.
    pub fps: f64,
    /// Records the planes were built from.
    pub record_count: usize,
    /// Timeline length shared by all planes.
    pub total_frames: usize,
    /// Number of planes declared in the stream.
    pub plane_count: usize,
    /// Number of planes reported empty.
    pub empty_planes: usize,
    /// Number of planes with statistics.
    pub analyzed_planes: usize,
    /// One block per plane, in plane order.
    pub planes: Vec<PlaneReport>,
}

impl Report {
    /// Indices of analyzed planes.
    pub fn analyzed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.planes
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.index)
    }
}

/// Computes a [`Report`] from a reconstructed [`Dataset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneAnalyzer;

impl PlaneAnalyzer {
    /// Analyze every plane of `dataset`.
    ///
    /// Timelines of empty planes are cleared in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFrameRate`] if the dataset's frame-rate code
    /// has no nominal rate. No plane is touched in that case.
    pub fn analyze(&self, dataset: &mut Dataset) -> Result<Report> {
        let frame_rate = FrameRate::from_code(dataset.frame_rate_code)?;

        let mut planes = Vec::with_capacity(dataset.planes.len());
        for (index, timeline) in dataset.planes.iter().enumerate() {
            let state = match plane_stats(timeline) {
                Some(mut stats) => {
                    stats.identical_planes = dataset
                        .planes
                        .iter()
                        .enumerate()
                        .filter(|(other, t)| *other != index && *t == timeline)
                        .map(|(other, _)| other)
                        .collect();
                    if stats.degenerate {
                        warn!(
                            plane = index,
                            depth = stats.min_depth,
                            "3D-Plane has a fixed depth"
                        );
                    }
                    PlaneState::Analyzed(stats)
                }
                None => {
                    debug!(plane = index, "3D-Plane is empty");
                    PlaneState::Empty
                }
            };
            planes.push(PlaneReport {
                index,
                num_frames: timeline.len(),
                state,
            });
        }

        for report in planes.iter().filter(|p| p.is_empty()) {
            dataset.planes[report.index].clear();
        }

        let empty_planes = planes.iter().filter(|p| p.is_empty()).count();
        let report = Report {
            frame_rate,
            frame_rate_code: dataset.frame_rate_code,
            fps: frame_rate.fps(),
            record_count: dataset.record_count,
            total_frames: dataset.total_frames(),
            plane_count: planes.len(),
            empty_planes,
            analyzed_planes: planes.len() - empty_planes,
            planes,
        };
        info!(
            planes = report.plane_count,
            empty = report.empty_planes,
            fps = %frame_rate,
            "Analysis complete"
        );
        Ok(report)
    }
}

/// Map a raw, non-sentinel depth byte to its signed depth.
#[must_use]
pub fn depth_value(byte: u8) -> i16 {
    let value = i16::from(byte);
    if byte > SENTINEL {
        128 - value
    } else {
        value
    }
}

/// Statistics of one timeline, or `None` if it holds only sentinels.
///
/// `identical_planes` is left empty; it depends on the other planes.
#[must_use]
pub fn plane_stats(timeline: &[u8]) -> Option<PlaneStats> {
    let first_defined_index = timeline.iter().position(|&b| b != SENTINEL)?;
    let last_defined_index = timeline.iter().rposition(|&b| b != SENTINEL)?;

    let mut min_depth = i16::MAX;
    let mut max_depth = i16::MIN;
    let mut sum: i64 = 0;
    let mut undefined_count = 0;
    let mut cuts = 0;
    let mut previous: Option<u8> = None;

    for &byte in timeline {
        if previous != Some(byte) {
            cuts += 1;
            previous = Some(byte);
        }
        if byte == SENTINEL {
            undefined_count += 1;
            continue;
        }
        let value = depth_value(byte);
        min_depth = min_depth.min(value);
        max_depth = max_depth.max(value);
        sum += i64::from(value);
    }

    let defined = timeline.len() - undefined_count;
    #[allow(clippy::cast_precision_loss)]
    let average_depth = round2(sum as f64 / defined as f64);

    Some(PlaneStats {
        min_depth,
        max_depth,
        average_depth,
        cuts,
        first_defined_index,
        last_defined_index,
        undefined_count,
        degenerate: min_depth == max_depth,
        identical_planes: Vec::new(),
    })
}

/// Round to two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
