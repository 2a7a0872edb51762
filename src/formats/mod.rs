//! Tab-delimited bioinformatics format parsers
//!
//! SAM and VCF share the same line discipline: sigil-prefixed header
//! lines feeding per-format metadata, followed by tab-delimited data
//! rows. Both parsers stream records one at a time and absorb malformed
//! rows by skipping and counting them.

pub mod sam;
pub mod vcf;

pub use sam::{SamHeader, SamRecord, SamStream};
pub use vcf::{VcfRecord, VcfStream};
