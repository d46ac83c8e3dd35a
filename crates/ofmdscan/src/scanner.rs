//! Marker scanning over an arbitrarily large byte stream.
//!
//! The stream is pulled forward in fixed-size chunks through a
//! [`SearchWindow`]. Every occurrence of [`MARKER`] is considered, including
//! occurrences that overlap a previous record, and the [`RECORD_LEN`] bytes
//! starting at each plausible occurrence are captured as a [`RawRecord`].
//!
//! Nothing is ever re-read: the window keeps the bytes between the cursor and
//! the end of the last read, and drops everything behind the cursor before
//! pulling more data.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ScanConfig, DEFAULT_CHUNK_SIZE};
use crate::error::Result;
use crate::record::{self, RawRecord, MARKER, RECORD_LEN};

/// A marker hit too close to the end of the stream to hold a full record.
///
/// The candidate is dropped and scanning continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TruncatedRecord {
    /// Absolute offset of the marker.
    pub offset: u64,
    /// Bytes available from the marker to the end of the stream.
    pub available: usize,
}

impl fmt::Display for TruncatedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "truncated OFMD record at offset {}: {} of {RECORD_LEN} bytes available",
            self.offset, self.available
        )
    }
}

/// Everything a scan produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Accepted records in stream order.
    pub records: Vec<RawRecord>,
    /// Marker hits that failed the frame-rate plausibility check.
    pub rejected: usize,
    /// Marker hits dropped for lack of trailing bytes.
    pub truncated: Vec<TruncatedRecord>,
    /// Bytes pulled from the source.
    pub bytes_scanned: u64,
}

/// Growable lookahead buffer over a forward-only reader.
#[derive(Debug)]
pub struct SearchWindow<R> {
    reader: R,
    buf: Vec<u8>,
    /// Absolute stream offset of `buf[0]`.
    base: u64,
    /// Search position within `buf`.
    cursor: usize,
    chunk_size: usize,
    eof: bool,
}

impl<R: Read> SearchWindow<R> {
    /// Create a window whose first byte sits at absolute offset `base`.
    pub fn starting_at(reader: R, chunk_size: usize, base: u64) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(chunk_size + RECORD_LEN),
            base,
            cursor: 0,
            chunk_size: chunk_size.max(1),
            eof: false,
        }
    }

    /// Absolute offset just past the last byte pulled from the reader.
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.base + self.buf.len() as u64
    }

    /// Absolute offset of the search cursor.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.base + self.cursor as u64
    }

    /// Move the cursor forward to the next occurrence of `needle`.
    ///
    /// Returns the absolute offset of the match, or `None` once the stream is
    /// exhausted. A match spanning two reads is still found.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the underlying stream fails.
    pub fn find(&mut self, needle: &[u8]) -> io::Result<Option<u64>> {
        loop {
            if let Some(k) = find_in(&self.buf[self.cursor..], needle) {
                self.cursor += k;
                return Ok(Some(self.position()));
            }

            // Keep a needle-sized tail so a split match is seen after the next read
            let tail = self.buf.len().saturating_sub(needle.len().saturating_sub(1));
            self.cursor = tail.max(self.cursor);

            if self.eof || self.fill()? == 0 {
                return Ok(None);
            }
        }
    }

    /// Borrow `len` bytes starting at the cursor, reading more if needed.
    ///
    /// # Errors
    ///
    /// Returns `Ok(Err(available))` when the stream ends first, and an I/O
    /// error if reading fails.
    pub fn peek(&mut self, len: usize) -> io::Result<std::result::Result<&[u8], usize>> {
        while self.buf.len() - self.cursor < len {
            if self.eof || self.fill()? == 0 {
                return Ok(Err(self.buf.len() - self.cursor));
            }
        }
        Ok(Ok(&self.buf[self.cursor..self.cursor + len]))
    }

    /// Step the cursor one byte past its current position.
    pub fn advance(&mut self) {
        if self.cursor < self.buf.len() {
            self.cursor += 1;
        }
    }

    fn compact(&mut self) {
        if self.cursor > 0 {
            self.buf.drain(..self.cursor);
            self.base += self.cursor as u64;
            self.cursor = 0;
        }
    }

    fn fill(&mut self) -> io::Result<usize> {
        self.compact();
        let start = self.buf.len();
        self.buf.resize(start + self.chunk_size, 0);
        let read = loop {
            match self.reader.read(&mut self.buf[start..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(e);
                }
            }
        };
        self.buf.truncate(start + read);
        if read == 0 {
            self.eof = true;
        }
        Ok(read)
    }
}

fn find_in(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Locates OFMD markers and captures candidate records.
#[derive(Debug, Clone, Copy)]
pub struct MarkerScanner {
    chunk_size: usize,
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl MarkerScanner {
    /// Create a scanner reading `chunk_size` bytes at a time.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Create a scanner from the `[scan]` configuration section.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.chunk_size)
    }

    /// Scan a seekable source from its current position to the end.
    ///
    /// # Errors
    ///
    /// Returns an error if seeking or reading the source fails.
    pub fn scan<R: Read + Seek>(&self, mut source: R) -> Result<ScanOutcome> {
        let start = source.stream_position()?;
        let total_len = remaining_len(&mut source)?;
        self.scan_from(source, start, total_len, |_| {})
    }

    /// Scan `total_len` bytes of `reader`, reporting progress after each marker.
    ///
    /// `progress` receives the integer percentage of bytes consumed; the
    /// values it sees never decrease.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the source fails.
    pub fn scan_with_progress<R, F>(
        &self,
        reader: R,
        total_len: u64,
        progress: F,
    ) -> Result<ScanOutcome>
    where
        R: Read,
        F: FnMut(u8),
    {
        self.scan_from(reader, 0, total_len, progress)
    }

    /// Like [`scan_with_progress`](Self::scan_with_progress) for a reader
    /// whose first byte lies at absolute offset `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the source fails.
    pub fn scan_from<R, F>(
        &self,
        reader: R,
        start: u64,
        total_len: u64,
        mut progress: F,
    ) -> Result<ScanOutcome>
    where
        R: Read,
        F: FnMut(u8),
    {
        let mut window = SearchWindow::starting_at(reader, self.chunk_size, start);
        let mut outcome = ScanOutcome::default();

        while let Some(offset) = window.find(MARKER)? {
            match window.peek(RECORD_LEN)? {
                Ok(bytes) => {
                    let code = record::frame_rate_code(bytes);
                    if record::is_plausible(code) {
                        debug!(offset, code, "Accepted OFMD record");
                        outcome.records.push(RawRecord::new(offset, bytes.to_vec()));
                    } else {
                        debug!(offset, code, "Rejected OFMD candidate");
                        outcome.rejected += 1;
                    }
                }
                Err(available) => {
                    let truncated = TruncatedRecord { offset, available };
                    warn!("{truncated}");
                    outcome.truncated.push(truncated);
                }
            }

            progress(percent(window.consumed() - start, total_len));
            window.advance();
        }

        outcome.bytes_scanned = window.consumed() - start;
        info!(
            records = outcome.records.len(),
            rejected = outcome.rejected,
            truncated = outcome.truncated.len(),
            bytes = outcome.bytes_scanned,
            "Scan complete"
        );
        Ok(outcome)
    }
}

/// Bytes between the current position of `source` and its end.
///
/// The position is restored before returning.
///
/// # Errors
///
/// Returns an error if seeking fails.
pub fn remaining_len<S: Seek>(source: &mut S) -> io::Result<u64> {
    let here = source.stream_position()?;
    let end = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(here))?;
    Ok(end.saturating_sub(here))
}

fn percent(consumed: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = u128::from(consumed.min(total)) * 100 / u128::from(total);
    u8::try_from(pct).unwrap_or(100)
}
