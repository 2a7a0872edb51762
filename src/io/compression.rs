//! Transparent gzip support for record streams
//!
//! The readers in this crate only require a sequential line source. This
//! module supplies that source: [`DataSource`] names where the bytes come
//! from, [`CompressedReader`] sniffs the gzip magic bytes and decompresses
//! on the fly when present. [`CompressedWriter`] is the write counterpart,
//! selecting gzip output by file extension.

use crate::error::Result;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::io::sink::DataSink;

/// Input source for a record stream
///
/// Opening a source that does not exist fails immediately; this is the
/// only point where a missing file surfaces as an error.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Local file path
    Local(PathBuf),
}

impl DataSource {
    /// Create a local file data source
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        DataSource::Local(path.as_ref().to_path_buf())
    }

    /// Open the data source and return a buffered reader
    pub fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        match self {
            DataSource::Local(path) => {
                let file = File::open(path)?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

/// Buffered reader with automatic gzip detection
///
/// Compression is detected from content, not extension: the first two
/// bytes are peeked without consuming them, and `[31, 139]` selects a
/// multi-member gzip decoder. Anything else passes through unchanged.
pub struct CompressedReader {
    inner: Box<dyn BufRead + Send>,
}

impl CompressedReader {
    /// Create a new reader from a data source
    pub fn new(source: DataSource) -> Result<Self> {
        let mut reader = source.open()?;

        let first_bytes = {
            let peeked = reader.fill_buf()?;
            if peeked.len() >= 2 {
                [peeked[0], peeked[1]]
            } else if peeked.len() == 1 {
                [peeked[0], 0]
            } else {
                [0, 0]
            }
        };

        let is_gzipped = first_bytes[0] == 31 && first_bytes[1] == 139;

        if is_gzipped {
            let decoder = MultiGzDecoder::new(reader);
            Ok(Self {
                inner: Box::new(BufReader::new(decoder)),
            })
        } else {
            Ok(Self { inner: reader })
        }
    }
}

impl Read for CompressedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for CompressedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

/// Writer with automatic gzip compression by sink extension
///
/// `.gz`/`.gzip` sinks are gzip-compressed with the default level; all
/// other sinks (including stdout) are written uncompressed. Call
/// [`finish`](CompressedWriter::finish) to finalize the stream — `Drop`
/// only flushes best-effort and cannot report errors.
pub enum CompressedWriter {
    /// Uncompressed writer with buffering
    Plain(Option<BufWriter<Box<dyn Write>>>),
    /// Gzip compressed writer
    Gzip(Option<GzEncoder<BufWriter<Box<dyn Write>>>>),
}

impl CompressedWriter {
    /// Create a new writer from a data sink
    pub fn new(sink: DataSink) -> io::Result<Self> {
        match sink {
            DataSink::Local(path) => {
                let file = File::create(&path)?;
                let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
                match ext {
                    "gz" | "gzip" => Self::new_gzip(Box::new(file)),
                    _ => Self::new_plain(Box::new(file)),
                }
            }
            DataSink::Stdout => Self::new_plain(Box::new(io::stdout())),
        }
    }

    /// Create a plain (uncompressed) writer
    pub fn new_plain(writer: Box<dyn Write>) -> io::Result<Self> {
        Ok(Self::Plain(Some(BufWriter::new(writer))))
    }

    /// Create a gzip compressed writer
    pub fn new_gzip(writer: Box<dyn Write>) -> io::Result<Self> {
        let encoder = GzEncoder::new(BufWriter::new(writer), Compression::default());
        Ok(Self::Gzip(Some(encoder)))
    }

    /// Finish writing and consume the writer
    ///
    /// Flushes buffered data and, for gzip output, writes the stream
    /// trailer. Errors here are real data loss, so prefer this over Drop.
    pub fn finish(mut self) -> io::Result<()> {
        match &mut self {
            Self::Plain(w) => match w.take() {
                Some(mut writer) => writer.flush(),
                None => Ok(()),
            },
            Self::Gzip(w) => match w.take() {
                Some(encoder) => {
                    let _ = encoder.finish()?;
                    Ok(())
                }
                None => Ok(()),
            },
        }
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(Some(w)) => w.write(buf),
            Self::Gzip(Some(w)) => w.write(buf),
            _ => Err(io::Error::new(
                io::ErrorKind::Other,
                "Cannot write to finished writer",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(Some(w)) => w.flush(),
            Self::Gzip(Some(w)) => w.flush(),
            _ => Ok(()),
        }
    }
}

impl Drop for CompressedWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
