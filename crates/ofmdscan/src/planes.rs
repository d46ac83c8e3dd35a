//! Per-plane depth timelines rebuilt from OFMD records.

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::record::RawRecord;

/// Byte value meaning "no depth defined for this frame".
pub const SENTINEL: u8 = 0x80;

/// The depth samples of one plane, one byte per frame, in stream order.
pub type PlaneTimeline = Vec<u8>;

/// Reconstructed planes of a whole stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Frame-rate code taken from the first record.
    pub frame_rate_code: u8,
    /// Frames contributed by each record.
    pub frames_per_record: u8,
    /// Number of records the timelines were built from.
    pub record_count: usize,
    /// One timeline per plane, indexed by plane number.
    pub planes: Vec<PlaneTimeline>,
}

impl Dataset {
    /// Number of planes declared by the first record.
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Length of every timeline.
    #[must_use]
    pub fn total_frames(&self) -> usize {
        usize::from(self.frames_per_record) * self.record_count
    }
}

/// Builds a [`Dataset`] out of accepted records.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneReconstructor;

impl PlaneReconstructor {
    /// Slice every record into per-plane timelines.
    ///
    /// The layout (frame-rate code, plane count, frame count) comes from the
    /// first record. Every later record must declare the same frame count.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if `records` is empty.
    /// - [`Error::InvalidLayout`] if the first record declares zero planes or frames.
    /// - [`Error::InconsistentLayout`] if a later record declares another frame count.
    /// - [`Error::BoundsError`] if a plane slice runs past the end of a record.
    pub fn reconstruct(&self, records: &[RawRecord]) -> Result<Dataset> {
        let first = records.first().ok_or(Error::EmptyInput)?;

        let frame_rate_code = first.frame_rate_code();
        let plane_count = first.plane_count();
        let frame_count = first.frame_count();
        if plane_count == 0 || frame_count == 0 {
            return Err(Error::InvalidLayout {
                plane_count,
                frame_count,
            });
        }
        debug!(
            frame_rate_code,
            plane_count, frame_count, "Layout read from first OFMD record"
        );

        let planes_n = usize::from(plane_count);
        let frames_n = usize::from(frame_count);
        let mut planes: Vec<PlaneTimeline> = (0..planes_n)
            .map(|_| Vec::with_capacity(frames_n * records.len()))
            .collect();

        for (index, record) in records.iter().enumerate() {
            let found = record.frame_count();
            if found != frame_count {
                return Err(Error::InconsistentLayout {
                    record: index,
                    expected: frame_count,
                    found,
                });
            }

            let bytes = record.as_bytes();
            for (plane, timeline) in planes.iter_mut().enumerate() {
                let range = RawRecord::plane_range(plane, frames_n);
                let slice = bytes.get(range.clone()).ok_or(Error::BoundsError {
                    record: index,
                    plane,
                    end: range.end,
                    len: bytes.len(),
                })?;
                timeline.extend_from_slice(slice);
            }
            trace!(record = index, offset = record.offset(), "Sliced OFMD record");
        }

        Ok(Dataset {
            frame_rate_code,
            frames_per_record: frame_count,
            record_count: records.len(),
            planes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MARKER, RECORD_LEN};

    fn record(rate: u8, planes: u8, frames: u8, depths: &[u8]) -> RawRecord {
        let mut bytes = vec![0u8; RECORD_LEN];
        bytes[..4].copy_from_slice(MARKER);
        bytes[4] = rate;
        bytes[10] = planes;
        bytes[11] = frames;
        bytes[14..14 + depths.len()].copy_from_slice(depths);
        RawRecord::new(0, bytes)
    }

    #[test]
    fn test_reconstruct_concatenates_in_record_order() {
        let records: Vec<RawRecord> = (0..4)
            .map(|_| record(1, 2, 3, &[10, 11, 12, 20, 21, 22]))
            .collect();

        let dataset = PlaneReconstructor.reconstruct(&records).unwrap();
        assert_eq!(dataset.frame_rate_code, 1);
        assert_eq!(dataset.plane_count(), 2);
        assert_eq!(dataset.total_frames(), 12);
        assert_eq!(
            dataset.planes[0],
            vec![10, 11, 12, 10, 11, 12, 10, 11, 12, 10, 11, 12]
        );
        assert_eq!(
            dataset.planes[1],
            vec![20, 21, 22, 20, 21, 22, 20, 21, 22, 20, 21, 22]
        );
    }

    #[test]
    fn test_reconstruct_keeps_record_order() {
        let records = vec![record(2, 1, 2, &[1, 2]), record(2, 1, 2, &[3, 4])];
        let dataset = PlaneReconstructor.reconstruct(&records).unwrap();
        assert_eq!(dataset.planes, vec![vec![1, 2, 3, 4]]);
        assert_eq!(dataset.record_count, 2);
    }

    #[test]
    fn test_header_masks_high_bits() {
        let records = vec![record(0x91, 0x81, 0x82, &[7, 8])];
        let dataset = PlaneReconstructor.reconstruct(&records).unwrap();
        assert_eq!(dataset.frame_rate_code, 1);
        assert_eq!(dataset.planes, vec![vec![7, 8]]);
    }

    #[test]
    fn test_empty_input() {
        let err = PlaneReconstructor.reconstruct(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_zero_planes_is_invalid_layout() {
        let err = PlaneReconstructor
            .reconstruct(&[record(1, 0, 24, &[])])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLayout {
                plane_count: 0,
                frame_count: 24
            }
        ));
    }

    #[test]
    fn test_zero_frames_is_invalid_layout() {
        let err = PlaneReconstructor
            .reconstruct(&[record(1, 0x80, 0x80, &[])])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLayout { .. }));
    }

    #[test]
    fn test_differing_frame_count_is_reported() {
        let records = vec![
            record(1, 1, 3, &[1, 2, 3]),
            record(1, 1, 3, &[1, 2, 3]),
            record(1, 1, 2, &[1, 2]),
        ];
        let err = PlaneReconstructor.reconstruct(&records).unwrap_err();
        assert!(matches!(
            err,
            Error::InconsistentLayout {
                record: 2,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_slice_past_record_end() {
        // 127 planes of 127 frames cannot fit in 4096 bytes
        let err = PlaneReconstructor
            .reconstruct(&[record(1, 127, 127, &[])])
            .unwrap_err();
        match err {
            Error::BoundsError {
                record, plane, len, ..
            } => {
                assert_eq!(record, 0);
                assert_eq!(len, RECORD_LEN);
                assert_eq!(plane, (RECORD_LEN - 14) / 127);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_record_is_bounds_error() {
        let mut bytes = vec![0u8; 20];
        bytes[..4].copy_from_slice(MARKER);
        bytes[4] = 1;
        bytes[10] = 2;
        bytes[11] = 4;
        let err = PlaneReconstructor
            .reconstruct(&[RawRecord::new(0, bytes)])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BoundsError {
                record: 0,
                plane: 1,
                end: 22,
                len: 20
            }
        ));
    }
}
