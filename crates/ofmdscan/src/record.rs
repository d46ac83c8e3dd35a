//! Raw OFMD records and their bit-packed header fields.
//!
//! A record is the fixed-size block of bytes that starts at an `OFMD` marker.
//! Only three header fields matter here:
//!
//! | byte | bits | field            |
//! |------|------|------------------|
//! | 4    | 0..4 | frame-rate code  |
//! | 10   | 0..7 | plane count      |
//! | 11   | 0..7 | frames per plane |
//!
//! Depth samples start at byte [`DEPTH_OFFSET`]; plane `p` occupies
//! `frame_count` consecutive bytes at `DEPTH_OFFSET + p * frame_count`.

/// The four-byte marker that opens every OFMD structure.
pub const MARKER: &[u8; 4] = b"OFMD";

/// Number of bytes captured for each record.
pub const RECORD_LEN: usize = 4096;

/// Offset of the first depth sample.
pub const DEPTH_OFFSET: usize = 14;

const FRAME_RATE_BYTE: usize = 4;
const PLANE_COUNT_BYTE: usize = 10;
const FRAME_COUNT_BYTE: usize = 11;

/// An opaque OFMD record as captured from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    offset: u64,
    bytes: Vec<u8>,
}

impl RawRecord {
    /// Wrap bytes captured at `offset` in the source stream.
    #[must_use]
    pub fn new(offset: u64, bytes: Vec<u8>) -> Self {
        Self { offset, bytes }
    }

    /// Absolute stream offset of the marker this record starts at.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The record bytes, marker included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Record length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the record holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Low nibble of byte 4.
    #[must_use]
    pub fn frame_rate_code(&self) -> u8 {
        frame_rate_code(&self.bytes)
    }

    /// Low 7 bits of byte 10.
    #[must_use]
    pub fn plane_count(&self) -> u8 {
        self.byte(PLANE_COUNT_BYTE) & 0x7F
    }

    /// Low 7 bits of byte 11.
    #[must_use]
    pub fn frame_count(&self) -> u8 {
        self.byte(FRAME_COUNT_BYTE) & 0x7F
    }

    /// Byte range of plane `plane` for a given frame count.
    #[must_use]
    pub fn plane_range(plane: usize, frame_count: usize) -> std::ops::Range<usize> {
        let start = DEPTH_OFFSET + plane * frame_count;
        start..start + frame_count
    }

    fn byte(&self, index: usize) -> u8 {
        self.bytes.get(index).copied().unwrap_or(0)
    }
}

/// Frame-rate nibble of a candidate that may be shorter than a full record.
///
/// Missing bytes read as zero, which no plausibility check accepts.
#[must_use]
pub fn frame_rate_code(bytes: &[u8]) -> u8 {
    bytes.get(FRAME_RATE_BYTE).copied().unwrap_or(0) & 0x0F
}

/// Cheap sanity check applied to every marker hit.
///
/// The nibble is accepted in `1..=7`. Code 5 passes here even though it has
/// no nominal rate; it is rejected later when the file is analyzed.
#[must_use]
pub fn is_plausible(frame_rate_code: u8) -> bool {
    (1..=7).contains(&frame_rate_code)
}
