//! FASTA streaming parser and filtered re-emission
//!
//! # Format
//!
//! FASTA format consists of:
//! - Header line starting with '>' followed by an identifier and optional
//!   description
//! - One or more sequence lines (can be wrapped)
//!
//! Example:
//! ```text
//! >sequence1 description
//! GATTACAGATTACA
//! TGCATGCA
//! >sequence2
//! ACGTACGT
//! ```
//!
//! # Boundary rules
//!
//! A `>` line closes the previous record (if any) and opens a new one.
//! Blank lines are ignored. Non-header lines before the first `>` are
//! skipped and counted, never raised as errors. End of input closes the
//! last open record. A header with no sequence lines still yields a
//! record, so the record count always equals the number of `>` lines.

use crate::error::Result;
use crate::io::compression::{CompressedReader, CompressedWriter, DataSource};
use crate::io::sink::DataSink;
use crate::stats::LengthStats;
use crate::types::{FastaRecord, SequenceStats};
use std::io::{BufRead, Write};
use std::path::Path;

/// FASTA streaming parser with constant memory footprint
///
/// Yields records strictly in source order in a single forward pass. The
/// stream owns its source and is consumed by iteration; to re-read, build
/// a fresh stream (the source is re-opened from the start). Exclusive
/// access is guaranteed by `&mut` iteration — two interleaved passes over
/// one stream cannot compile.
///
/// # Example
///
/// ```no_run
/// use bioline::FastaStream;
///
/// let stream = FastaStream::from_path("genome.fa.gz")?;
/// for record in stream {
///     let record = record?;
///     println!("{}: {} bp", record.header, record.sequence.len());
/// }
/// # Ok::<(), bioline::BiolineError>(())
/// ```
pub struct FastaStream<R: BufRead> {
    reader: R,
    line_buffer: String,
    line_number: usize,
    finished: bool,
    /// Peeked header line for the next record (without '>')
    next_header: Option<String>,
    skipped_lines: u64,
}

impl FastaStream<CompressedReader> {
    /// Create a FASTA stream from a data source
    pub fn new(source: DataSource) -> Result<Self> {
        let reader = CompressedReader::new(source)?;
        Ok(Self::from_reader(reader))
    }

    /// Create a FASTA stream from a local file path
    ///
    /// Fails immediately if the path does not exist. Gzip input is
    /// detected from content and decompressed transparently.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(DataSource::from_path(path))
    }
}

impl<R: BufRead> FastaStream<R> {
    /// Create a FASTA stream from any buffered reader
    ///
    /// Useful for testing or reading from in-memory sources.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(256),
            line_number: 0,
            finished: false,
            next_header: None,
            skipped_lines: 0,
        }
    }

    /// Number of non-blank lines skipped before the first header
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Read the next line into the reused buffer
    ///
    /// Returns `false` at end of input; the trimmed content is read from
    /// `self.line_buffer` by the caller.
    fn fill_line(&mut self) -> Result<bool> {
        self.line_buffer.clear();
        if self.reader.read_line(&mut self.line_buffer)? == 0 {
            return Ok(false);
        }
        self.line_number += 1;
        Ok(true)
    }

    /// Read a single FASTA record
    fn read_record(&mut self) -> Result<Option<FastaRecord>> {
        // Find the header: either peeked during the previous record or the
        // next '>' line in the input. Anything else before it is dropped.
        let header = loop {
            if let Some(peeked) = self.next_header.take() {
                break peeked;
            }
            if self.finished {
                return Ok(None);
            }
            if !self.fill_line()? {
                self.finished = true;
                return Ok(None);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('>') {
                break rest.trim().to_string();
            }
            self.skipped_lines += 1;
            log::debug!("skipping line {} outside any record", self.line_number);
        };

        // Accumulate sequence lines until the next header or end of input
        let mut sequence = Vec::new();
        loop {
            if !self.fill_line()? {
                self.finished = true;
                break;
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('>') {
                self.next_header = Some(rest.trim().to_string());
                break;
            }
            sequence.extend_from_slice(line.as_bytes());
        }

        Ok(Some(FastaRecord::new(header, sequence)))
    }
}

impl<R: BufRead> Iterator for FastaStream<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Writes FASTA records in the same textual grammar they were read from
///
/// Each record becomes a header line followed by one sequence line (no
/// re-wrapping). Gzip output is selected by the sink extension.
pub struct FastaWriter {
    writer: CompressedWriter,
}

impl FastaWriter {
    /// Create a writer from a data sink
    pub fn new(sink: DataSink) -> Result<Self> {
        Ok(Self {
            writer: CompressedWriter::new(sink)?,
        })
    }

    /// Create a writer from a local file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(DataSink::from_path(path))
    }

    /// Write a single record
    pub fn write_record(&mut self, record: &FastaRecord) -> Result<()> {
        self.writer.write_all(b">")?;
        self.writer.write_all(record.header.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.write_all(&record.sequence)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Finish writing, flushing buffers and finalizing compression
    pub fn finish(self) -> Result<()> {
        self.writer.finish()?;
        Ok(())
    }
}

/// Check whether a file looks like FASTA
///
/// Reads the first line only and tests for the `>` sentinel. Returns
/// `false` for unreadable files rather than failing: this is a format
/// probe, not a parse.
pub fn validate_format<P: AsRef<Path>>(path: P) -> bool {
    let mut stream = match FastaStream::from_path(path) {
        Ok(stream) => stream,
        Err(_) => return false,
    };
    match stream.fill_line() {
        Ok(true) => stream.line_buffer.trim().starts_with('>'),
        _ => false,
    }
}

/// Count the records in a FASTA file in one pass
pub fn sequence_count<P: AsRef<Path>>(path: P) -> Result<u64> {
    let mut count = 0;
    for record in FastaStream::from_path(path)? {
        record?;
        count += 1;
    }
    Ok(count)
}

/// Mean sequence length of a FASTA file (0.0 when empty), one pass
pub fn average_length<P: AsRef<Path>>(path: P) -> Result<f64> {
    Ok(statistics(path)?.average_length)
}

/// Length statistics for a FASTA file in one pass
pub fn statistics<P: AsRef<Path>>(path: P) -> Result<SequenceStats> {
    let mut lengths = LengthStats::default();
    for record in FastaStream::from_path(path)? {
        lengths.observe(record?.sequence.len() as u64);
    }
    Ok(lengths.summary())
}

/// Re-emit the records of `input` passing a length filter to `output`
///
/// Bounds are inclusive; `None` leaves the upper bound open. Returns the
/// number of records written. Relative order is preserved.
pub fn write_filtered<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    min_len: usize,
    max_len: Option<usize>,
) -> Result<u64> {
    let stream = FastaStream::from_path(input)?;
    let mut writer = FastaWriter::from_path(output)?;
    let mut written = 0;

    for record in stream {
        let record = record?;
        let len = record.sequence.len();
        if len >= min_len && max_len.map_or(true, |max| len <= max) {
            writer.write_record(&record)?;
            written += 1;
        }
    }

    writer.finish()?;
    Ok(written)
}
