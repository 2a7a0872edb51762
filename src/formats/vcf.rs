//! VCF format parser (variant calls)
//!
//! # Format
//!
//! Metadata lines start with `##` and are kept verbatim. A single
//! `#CHROM` line declares the column schema (tab-split tokens with the
//! leading `#` stripped). Every following line is a tab-delimited data
//! row matched against that schema.
//!
//! # Boundary rules
//!
//! Data lines seen before the schema, rows missing a mandatory column,
//! and rows with non-numeric POS or QUAL are skipped and counted, never
//! fatal. A missing QUAL (`.`) is a legal value and normalizes to `None`;
//! it is distinct from a quality of zero and is excluded by every
//! quality threshold filter.

use crate::error::Result;
use crate::io::compression::{CompressedReader, DataSource};
use std::io::BufRead;
use std::path::Path;

/// Mandatory VCF columns, in schema order
const FIXED_COLUMNS: [&str; 8] = [
    "CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO",
];

/// One variant row, mandatory columns as typed fields
///
/// Columns the schema declares beyond the mandatory eight (FORMAT and
/// sample columns) are carried in `extra` as (column-name, value) pairs
/// in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfRecord {
    /// Chromosome or contig name
    pub chrom: String,
    /// 1-based position
    pub pos: u64,
    /// Variant identifier ('.' when absent)
    pub id: String,
    /// Reference allele
    pub reference: String,
    /// Alternate allele(s), comma-separated as written
    pub alternate: String,
    /// Phred-scaled quality; `None` for the missing sentinel '.'
    pub qual: Option<f64>,
    /// Filter status
    pub filter: String,
    /// INFO column, unparsed
    pub info: String,
    /// Schema-declared columns beyond the mandatory eight, in order
    pub extra: Vec<(String, String)>,
}

/// VCF streaming parser
///
/// Yields variant records in source order in a single pass. Metadata and
/// the column schema fill incrementally as header lines are encountered;
/// both are complete before the first record is yielded, since the
/// format places all header lines first.
///
/// # Example
///
/// ```no_run
/// use bioline::VcfStream;
///
/// let mut stream = VcfStream::from_path("variants.vcf")?;
/// for record in &mut stream {
///     let record = record?;
///     println!("{}:{} {:?}", record.chrom, record.pos, record.qual);
/// }
/// println!("{} metadata lines", stream.meta_lines().len());
/// # Ok::<(), bioline::BiolineError>(())
/// ```
pub struct VcfStream<R: BufRead> {
    reader: R,
    line_buffer: String,
    line_number: usize,
    meta: Vec<String>,
    columns: Vec<String>,
    skipped_lines: u64,
}

impl VcfStream<CompressedReader> {
    /// Create a VCF stream from a data source
    pub fn new(source: DataSource) -> Result<Self> {
        let reader = CompressedReader::new(source)?;
        Ok(Self::from_reader(reader))
    }

    /// Create a VCF stream from a local file path
    ///
    /// Fails immediately if the path does not exist.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(DataSource::from_path(path))
    }
}

impl<R: BufRead> VcfStream<R> {
    /// Create a VCF stream from any buffered reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(1024),
            line_number: 0,
            meta: Vec::new(),
            columns: Vec::new(),
            skipped_lines: 0,
        }
    }

    /// Metadata lines (`##`-prefixed) seen so far, verbatim and in order
    ///
    /// Complete once the first record has been yielded (all header lines
    /// precede the data), and certainly once the stream is exhausted.
    pub fn meta_lines(&self) -> &[String] {
        &self.meta
    }

    /// Column names declared by the `#CHROM` schema line
    ///
    /// Empty until the schema line has been consumed.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data lines dropped by validation
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    fn parse_data_line(columns: &[String], line: &str) -> Option<VcfRecord> {
        let fields: Vec<&str> = line.split('\t').collect();
        let pairs: Vec<(&str, &str)> = columns
            .iter()
            .map(String::as_str)
            .zip(fields.iter().copied())
            .collect();

        let get = |name: &str| {
            pairs
                .iter()
                .find(|(col, _)| *col == name)
                .map(|(_, value)| *value)
        };

        let pos = get("POS")?.parse::<u64>().ok()?;
        let qual = match get("QUAL")? {
            "." => None,
            value => Some(value.parse::<f64>().ok()?),
        };

        let extra = pairs
            .iter()
            .filter(|(col, _)| !FIXED_COLUMNS.contains(col))
            .map(|(col, value)| (col.to_string(), value.to_string()))
            .collect();

        Some(VcfRecord {
            chrom: get("CHROM")?.to_string(),
            pos,
            id: get("ID")?.to_string(),
            reference: get("REF")?.to_string(),
            alternate: get("ALT")?.to_string(),
            qual,
            filter: get("FILTER")?.to_string(),
            info: get("INFO")?.to_string(),
            extra,
        })
    }

    fn read_record(&mut self) -> Result<Option<VcfRecord>> {
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

            if line.starts_with("##") {
                self.meta.push(line.to_string());
                continue;
            }

            if let Some(rest) = line.strip_prefix('#') {
                // The schema line; any other '#' line is out of place
                if rest.starts_with("CHROM") {
                    self.columns = rest.split('\t').map(str::to_string).collect();
                } else {
                    self.skipped_lines += 1;
                    log::warn!("skipping unexpected '#' line {}", self.line_number);
                }
                continue;
            }

            if self.columns.is_empty() {
                self.skipped_lines += 1;
                log::warn!(
                    "skipping data line {} before #CHROM schema",
                    self.line_number
                );
                continue;
            }

            match Self::parse_data_line(&self.columns, line) {
                Some(record) => return Ok(Some(record)),
                None => {
                    self.skipped_lines += 1;
                    log::warn!(
                        "skipping malformed variant at line {}",
                        self.line_number
                    );
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for VcfStream<R> {
    type Item = Result<VcfRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    const VCF: &str = "\
##fileformat=VCFv4.2
##contig=<ID=chr1,length=248956422>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsample1
chr1\t150000\trs1\tA\tG\t50.0\tPASS\tDP=30\tGT\t0/1
chr1\t250000\t.\tC\tT\t.\tPASS\tDP=12\tGT\t1/1
chr2\t100\trs2\tG\tGA\t12.5\tq10\tDP=4\tGT\t0/1
";

    fn stream_of(data: &str) -> VcfStream<BufReader<Cursor<Vec<u8>>>> {
        VcfStream::from_reader(BufReader::new(Cursor::new(data.as_bytes().to_vec())))
    }

    #[test]
    fn test_parse_variants() {
        let records: Vec<_> = stream_of(VCF).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].chrom, "chr1");
        assert_eq!(records[0].pos, 150000);
        assert_eq!(records[0].id, "rs1");
        assert_eq!(records[0].reference, "A");
        assert_eq!(records[0].alternate, "G");
        assert_eq!(records[0].qual, Some(50.0));
        assert_eq!(records[0].filter, "PASS");
        assert_eq!(records[0].info, "DP=30");
    }

    #[test]
    fn test_missing_qual_is_none() {
        let records: Vec<_> = stream_of(VCF).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records[1].qual, None);
        // Missing and zero are distinct values
        assert_ne!(records[1].qual, Some(0.0));
    }

    #[test]
    fn test_schema_driven_extra_columns() {
        let records: Vec<_> = stream_of(VCF).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(
            records[0].extra,
            vec![
                ("FORMAT".to_string(), "GT".to_string()),
                ("sample1".to_string(), "0/1".to_string()),
            ]
        );
    }

    #[test]
    fn test_meta_and_columns_accessors() {
        let mut stream = stream_of(VCF);
        for record in &mut stream {
            record.unwrap();
        }

        assert_eq!(stream.meta_lines().len(), 2);
        assert_eq!(stream.meta_lines()[0], "##fileformat=VCFv4.2");
        assert_eq!(stream.columns()[0], "CHROM");
        assert_eq!(stream.columns().len(), 10);
    }

    #[test]
    fn test_data_before_schema_skipped() {
        let data = "chr1\t100\t.\tA\tG\t10\tPASS\tDP=1\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                    chr1\t200\t.\tA\tG\t10\tPASS\tDP=1\n";
        let mut stream = stream_of(data);
        let records: Vec<_> = (&mut stream).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pos, 200);
        assert_eq!(stream.skipped_lines(), 1);
    }

    #[test]
    fn test_bad_pos_and_qual_skipped() {
        let data = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                    chr1\tBADPOS\t.\tA\tG\t10\tPASS\tDP=1\n\
                    chr1\t300\t.\tA\tG\tBADQUAL\tPASS\tDP=1\n\
                    chr1\t400\t.\tA\tG\t10\tPASS\tDP=1\n";
        let mut stream = stream_of(data);
        let records: Vec<_> = (&mut stream).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pos, 400);
        assert_eq!(stream.skipped_lines(), 2);
    }

    #[test]
    fn test_short_row_skipped() {
        // Row is missing QUAL/FILTER/INFO entirely
        let data = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                    chr1\t100\t.\tA\n";
        let mut stream = stream_of(data);
        let records: Vec<_> = (&mut stream).collect::<Result<Vec<_>>>().unwrap();
        assert!(records.is_empty());
        assert_eq!(stream.skipped_lines(), 1);
    }

    #[test]
    fn test_no_extra_columns() {
        let data = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                    chr1\t100\t.\tA\tG\t10\tPASS\tDP=1\n";
        let records: Vec<_> = stream_of(data).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].extra.is_empty());
    }
}
