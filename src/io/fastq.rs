//! FASTQ streaming parser
//!
//! # Format
//!
//! Records are fixed 4-line groups: identifier line (prefixed `@`),
//! sequence line, separator line (content ignored), quality line encoded
//! as Phred+33 ASCII.
//!
//! # Boundary rules
//!
//! A group is emitted only if its first line is non-empty; an empty first
//! line or a partial trailing group (fewer than 4 lines) terminates the
//! stream silently, producing no record and no error. Groups whose
//! sequence and quality lengths differ are dropped as malformed and
//! counted, so every emitted record satisfies
//! `sequence.len() == quality.len()`.

use crate::error::Result;
use crate::io::compression::{CompressedReader, DataSource};
use crate::stats::{BaseComposition, LengthStats, QualityProfile};
use crate::types::{FastqRecord, SequenceStats};
use std::io::BufRead;
use std::path::Path;

/// FASTQ streaming parser with constant memory footprint
///
/// Yields records strictly in source order in a single forward pass,
/// reusing four line buffers across records. The stream owns its source;
/// re-reading requires constructing a fresh stream.
///
/// # Example
///
/// ```no_run
/// use bioline::FastqStream;
///
/// let stream = FastqStream::from_path("reads.fq.gz")?;
/// for record in stream {
///     let record = record?;
///     assert_eq!(record.sequence.len(), record.quality.len());
/// }
/// # Ok::<(), bioline::BiolineError>(())
/// ```
pub struct FastqStream<R: BufRead> {
    reader: R,
    line1: String,
    line2: String,
    line3: String,
    line4: String,
    line_number: usize,
    finished: bool,
    skipped_records: u64,
}

impl FastqStream<CompressedReader> {
    /// Create a FASTQ stream from a data source
    pub fn new(source: DataSource) -> Result<Self> {
        let reader = CompressedReader::new(source)?;
        Ok(Self::from_reader(reader))
    }

    /// Create a FASTQ stream from a local file path
    ///
    /// Fails immediately if the path does not exist. Gzip input is
    /// detected from content and decompressed transparently.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(DataSource::from_path(path))
    }
}

impl<R: BufRead> FastqStream<R> {
    /// Create a FASTQ stream from any buffered reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line1: String::with_capacity(256),
            line2: String::with_capacity(256),
            line3: String::with_capacity(256),
            line4: String::with_capacity(256),
            line_number: 0,
            finished: false,
            skipped_records: 0,
        }
    }

    /// Number of 4-line groups dropped for sequence/quality length mismatch
    pub fn skipped_records(&self) -> u64 {
        self.skipped_records
    }

    /// Read one 4-line group from the reader
    ///
    /// Returns `None` when the stream terminates: end of input, an empty
    /// identifier line, or a partial trailing group.
    fn read_record(&mut self) -> Result<Option<FastqRecord>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            self.line1.clear();
            self.line2.clear();
            self.line3.clear();
            self.line4.clear();

            if self.reader.read_line(&mut self.line1)? == 0 {
                self.finished = true;
                return Ok(None);
            }
            self.line_number += 1;

            // A group is only emitted if its first line is non-empty
            if self.line1.trim_end().is_empty() {
                self.finished = true;
                return Ok(None);
            }

            // Partial trailing groups are dropped, not errors
            for line in [&mut self.line2, &mut self.line3, &mut self.line4] {
                if self.reader.read_line(line)? == 0 {
                    self.finished = true;
                    return Ok(None);
                }
                self.line_number += 1;
            }

            let id_line = self.line1.trim_end();
            let id = id_line.strip_prefix('@').unwrap_or(id_line).to_string();
            let sequence = self.line2.trim_end().as_bytes().to_vec();
            let quality = self.line4.trim_end().as_bytes().to_vec();

            if sequence.len() != quality.len() {
                self.skipped_records += 1;
                log::warn!(
                    "skipping read '{}' at line {}: sequence length {} != quality length {}",
                    id,
                    self.line_number,
                    sequence.len(),
                    quality.len()
                );
                continue;
            }

            return Ok(Some(FastqRecord { id, sequence, quality }));
        }
    }
}

impl<R: BufRead> Iterator for FastqStream<R> {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Length statistics for a FASTQ file in one pass
pub fn statistics<P: AsRef<Path>>(path: P) -> Result<SequenceStats> {
    let mut lengths = LengthStats::default();
    for record in FastqStream::from_path(path)? {
        lengths.observe(record?.sequence.len() as u64);
    }
    Ok(lengths.summary())
}

/// Per-position mean quality for a FASTQ file in one pass
///
/// Memory is proportional to the longest read, not the record count.
pub fn quality_profile<P: AsRef<Path>>(path: P) -> Result<QualityProfile> {
    let mut profile = QualityProfile::default();
    for record in FastqStream::from_path(path)? {
        profile.observe(&record?.quality);
    }
    Ok(profile)
}

/// Per-position base composition for a FASTQ file in one pass
///
/// Memory is proportional to the longest read, not the record count.
pub fn base_composition<P: AsRef<Path>>(path: P) -> Result<BaseComposition> {
    let mut composition = BaseComposition::default();
    for record in FastqStream::from_path(path)? {
        composition.observe(&record?.sequence);
    }
    Ok(composition)
}
