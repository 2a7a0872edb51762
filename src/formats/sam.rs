//! SAM format parser (sequence alignments)
//!
//! # Format
//!
//! Header lines start with `@` followed by a 2-character tag (`@HD`,
//! `@SQ`, `@PG`, ...). Alignment lines are tab-delimited with at least 11
//! mandatory columns: QNAME, FLAG, RNAME, POS, MAPQ, CIGAR, RNEXT, PNEXT,
//! TLEN, SEQ, QUAL. Optional columns beyond the eleventh are ignored.
//!
//! # Boundary rules
//!
//! Header lines feed the header map and are not records. Alignment lines
//! with fewer than 11 fields, or with non-numeric FLAG/POS/MAPQ, are
//! skipped and counted, never fatal.

use crate::error::Result;
use crate::io::compression::{CompressedReader, DataSource};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// SAM header: 2-character tag to the ordered raw lines carrying it
///
/// Lines are stored verbatim (including the leading `@`) in source order
/// within each tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamHeader {
    entries: HashMap<String, Vec<String>>,
}

impl SamHeader {
    /// Raw header lines for a tag, in source order
    pub fn lines(&self, tag: &str) -> Option<&[String]> {
        self.entries.get(tag).map(Vec::as_slice)
    }

    /// Iterate over all tags present in the header
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of distinct tags
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no header lines have been seen
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, line: &str) {
        // Tag is the (up to) two characters following '@'
        let tag: String = line[1..].chars().take(2).collect();
        self.entries.entry(tag).or_default().push(line.to_string());
    }
}

/// One alignment line, reduced to the fields the query layer consumes
///
/// The mandatory RNEXT/PNEXT/TLEN columns are validated by the field
/// count but not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamRecord {
    /// Query (read) name
    pub qname: String,
    /// Bitwise flag
    pub flag: u16,
    /// Reference sequence name ('*' when unmapped)
    pub rname: String,
    /// 1-based leftmost mapping position (0 when unavailable)
    pub pos: u64,
    /// Mapping quality
    pub mapq: u8,
    /// CIGAR string ('*' when unavailable)
    pub cigar: String,
    /// Segment sequence
    pub sequence: Vec<u8>,
    /// Quality string (Phred+33)
    pub quality: Vec<u8>,
}

/// SAM streaming parser
///
/// Yields alignment records in source order in a single pass. The header
/// map fills incrementally as `@` lines are encountered: it is complete
/// only after the stream is exhausted, since SAM places all header lines
/// before the first alignment but nothing enforces that.
///
/// # Example
///
/// ```no_run
/// use bioline::SamStream;
///
/// let mut stream = SamStream::from_path("alignments.sam")?;
/// for record in &mut stream {
///     let record = record?;
///     println!("{} -> {}:{}", record.qname, record.rname, record.pos);
/// }
/// // Header is complete once iteration finished
/// if let Some(lines) = stream.header().lines("SQ") {
///     println!("{} reference sequences", lines.len());
/// }
/// # Ok::<(), bioline::BiolineError>(())
/// ```
pub struct SamStream<R: BufRead> {
    reader: R,
    line_buffer: String,
    line_number: usize,
    header: SamHeader,
    skipped_lines: u64,
}

/// Minimum mandatory columns in an alignment line
const MIN_FIELDS: usize = 11;

impl SamStream<CompressedReader> {
    /// Create a SAM stream from a data source
    pub fn new(source: DataSource) -> Result<Self> {
        let reader = CompressedReader::new(source)?;
        Ok(Self::from_reader(reader))
    }

    /// Create a SAM stream from a local file path
    ///
    /// Fails immediately if the path does not exist.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(DataSource::from_path(path))
    }
}

impl<R: BufRead> SamStream<R> {
    /// Create a SAM stream from any buffered reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(1024),
            line_number: 0,
            header: SamHeader::default(),
            skipped_lines: 0,
        }
    }

    /// Header map seen so far
    ///
    /// Populated during iteration; complete once the stream is exhausted.
    pub fn header(&self) -> &SamHeader {
        &self.header
    }

    /// Number of alignment lines dropped by validation
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    fn parse_alignment(fields: &[&str]) -> Option<SamRecord> {
        let flag = fields[1].parse::<u16>().ok()?;
        let pos = fields[3].parse::<u64>().ok()?;
        let mapq = fields[4].parse::<u8>().ok()?;
        Some(SamRecord {
            qname: fields[0].to_string(),
            flag,
            rname: fields[2].to_string(),
            pos,
            mapq,
            cigar: fields[5].to_string(),
            sequence: fields[9].as_bytes().to_vec(),
            quality: fields[10].as_bytes().to_vec(),
        })
    }

    fn read_record(&mut self) -> Result<Option<SamRecord>> {
        loop {
            self.line_buffer.clear();
            if self.reader.read_line(&mut self.line_buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.line_buffer.trim_end();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('@') {
                self.header.push(line);
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < MIN_FIELDS {
                self.skipped_lines += 1;
                log::warn!(
                    "skipping alignment at line {}: {} fields, need {}",
                    self.line_number,
                    fields.len(),
                    MIN_FIELDS
                );
                continue;
            }

            match Self::parse_alignment(&fields) {
                Some(record) => return Ok(Some(record)),
                None => {
                    self.skipped_lines += 1;
                    log::warn!(
                        "skipping alignment at line {}: non-numeric FLAG/POS/MAPQ",
                        self.line_number
                    );
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for SamStream<R> {
    type Item = Result<SamRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Count alignments per reference name
///
/// Works over any materialized or borrowed record collection.
pub fn alignment_counts<'a, I>(records: I) -> HashMap<String, u64>
where
    I: IntoIterator<Item = &'a SamRecord>,
{
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.rname.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    const SAM: &str = "\
@HD\tVN:1.6\tSO:coordinate
@SQ\tSN:chr1\tLN:248956422
@SQ\tSN:chr2\tLN:242193529
@PG\tID:bioline\tPN:bioline
read1\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII
read2\t4\t*\t0\t0\t*\t*\t0\t0\tGGGG\tIIII
read3\t16\tchr2\t555\t30\t4M\t*\t0\t0\tTTTT\tIIII
";

    fn stream_of(data: &str) -> SamStream<BufReader<Cursor<Vec<u8>>>> {
        SamStream::from_reader(BufReader::new(Cursor::new(data.as_bytes().to_vec())))
    }

    #[test]
    fn test_parse_alignments() {
        let records: Vec<_> = stream_of(SAM).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].qname, "read1");
        assert_eq!(records[0].flag, 0);
        assert_eq!(records[0].rname, "chr1");
        assert_eq!(records[0].pos, 100);
        assert_eq!(records[0].mapq, 60);
        assert_eq!(records[0].cigar, "4M");
        assert_eq!(records[0].sequence, b"ACGT");
        assert_eq!(records[0].quality, b"IIII");

        assert_eq!(records[1].flag, 4);
        assert_eq!(records[2].pos, 555);
    }

    #[test]
    fn test_header_map_populated_during_iteration() {
        let mut stream = stream_of(SAM);
        assert!(stream.header().is_empty());

        for record in &mut stream {
            record.unwrap();
        }

        let header = stream.header();
        assert_eq!(header.len(), 3);
        assert_eq!(header.lines("SQ").unwrap().len(), 2);
        assert_eq!(header.lines("HD").unwrap()[0], "@HD\tVN:1.6\tSO:coordinate");
        assert!(header.lines("RG").is_none());
    }

    #[test]
    fn test_short_lines_skipped() {
        let data = "read1\t0\tchr1\t100\t60\t4M\tACGT\tIIII\n\
                    read2\t0\tchr1\t200\t60\t4M\t*\t0\t0\tACGT\tIIII\n";
        let mut stream = stream_of(data);
        let records: Vec<_> = (&mut stream).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].qname, "read2");
        assert_eq!(stream.skipped_lines(), 1);
    }

    #[test]
    fn test_non_numeric_fields_skipped() {
        let data = "read1\tnotanumber\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\n\
                    read2\t0\tchr1\tBADPOS\t60\t4M\t*\t0\t0\tACGT\tIIII\n\
                    read3\t0\tchr1\t300\t60\t4M\t*\t0\t0\tACGT\tIIII\n";
        let mut stream = stream_of(data);
        let records: Vec<_> = (&mut stream).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].qname, "read3");
        assert_eq!(stream.skipped_lines(), 2);
    }

    #[test]
    fn test_extra_optional_fields_ignored() {
        let data = "read1\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\tNM:i:0\tMD:Z:4\n";
        let records: Vec<_> = stream_of(data).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quality, b"IIII");
    }

    #[test]
    fn test_alignment_counts() {
        let records: Vec<_> = stream_of(SAM).collect::<Result<Vec<_>>>().unwrap();
        let counts = alignment_counts(&records);
        assert_eq!(counts.get("chr1"), Some(&1));
        assert_eq!(counts.get("chr2"), Some(&1));
        assert_eq!(counts.get("*"), Some(&1));
    }

    #[test]
    fn test_empty_source() {
        let records: Vec<_> = stream_of("").collect::<Result<Vec<_>>>().unwrap();
        assert!(records.is_empty());
    }
}
