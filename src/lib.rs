//! bioline: streaming readers for line-oriented bioinformatics formats
//!
//! # Overview
//!
//! bioline turns flat text files in the common sequence, read, alignment,
//! and variant formats (FASTA, FASTQ, SAM, VCF) into lazily-produced
//! streams of typed records, and layers single-pass statistics and
//! composable filters on top — without ever holding the whole file in
//! memory.
//!
//! ## Key properties
//!
//! - **Streaming**: every reader is a one-shot iterator over one open
//!   source; memory stays bounded by the current record
//! - **Recover by skipping**: malformed data lines are dropped, counted,
//!   and logged — a broken line never aborts a pass
//! - **Single-pass statistics**: length, per-position quality, and base
//!   composition aggregates with memory proportional to read length
//! - **Pure filters**: length, flag-mask, quality-threshold, and region
//!   predicates over live streams or materialized collections
//! - **Transparent gzip**: compressed sources are detected by content
//!   and decompressed on the fly
//!
//! ## Quick Start
//!
//! ```no_run
//! use bioline::FastaStream;
//!
//! # fn main() -> bioline::Result<()> {
//! // Stream FASTA from file (constant memory)
//! let stream = FastaStream::from_path("genome.fa.gz")?;
//!
//! for record in stream {
//!     let record = record?;
//!     println!("{}: {} bp", record.header, record.sequence.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`io`]: streaming sequence parsers (FASTA, FASTQ) and compression
//! - [`formats`]: tab-delimited format parsers (SAM, VCF)
//! - [`stats`]: single-pass streaming aggregators
//! - [`query`]: filter predicates and region queries

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod formats;
pub mod io;
pub mod query;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{BiolineError, Result};
pub use formats::{SamHeader, SamRecord, SamStream, VcfRecord, VcfStream};
pub use io::{FastaStream, FastaWriter, FastqStream};
pub use query::{
    filter_by_flag, filter_by_length, filter_by_quality, filter_by_region, Region,
};
pub use stats::{BaseComposition, LengthStats, QualityProfile};
pub use types::{FastaRecord, FastqRecord, SequenceStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
