//! File-backed line readers for both ends of the session.
//!
//! - `LineSource` hands out lines in file order and wraps to the first line
//!   at end of file. Its cursor lives as long as the server's connection.
//! - `ReferenceFile` answers whether a reply occurs anywhere in the file,
//!   rewinding and scanning from the top on every check.
//!
//! Lines are raw bytes without their `\n` terminator.

use bytes::Bytes;
use std::fmt;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncSeek, AsyncSeekExt, BufReader};
use tracing::trace;

/// Read one line into `buf`, dropping the terminator.
/// Returns false at end of file.
async fn read_line<R>(reader: &mut BufReader<R>, buf: &mut Vec<u8>) -> std::io::Result<bool>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(true)
}

/// Circular, sequential line reader used by the server.
pub struct LineSource<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl LineSource<File> {
    /// Open a file for serving.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(File::open(path).await?))
    }
}

impl<R: AsyncRead + AsyncSeek + Unpin> LineSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::with_capacity(128),
        }
    }

    /// Next line in file order, wrapping to the first line at end of file.
    ///
    /// Returns `None` only when the file has no lines at all.
    pub async fn next_line(&mut self) -> std::io::Result<Option<Bytes>> {
        if read_line(&mut self.reader, &mut self.buf).await? {
            return Ok(Some(Bytes::copy_from_slice(&self.buf)));
        }

        trace!("End of file, wrapping to first line");
        self.reader.seek(SeekFrom::Start(0)).await?;

        if read_line(&mut self.reader, &mut self.buf).await? {
            Ok(Some(Bytes::copy_from_slice(&self.buf)))
        } else {
            Ok(None)
        }
    }
}

/// Outcome of checking one reply against the reference file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Reply matches some line of the file
    Ok,
    /// No line matches
    Missing,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => f.write_str("OK"),
            Verdict::Missing => f.write_str("MISSING"),
        }
    }
}

/// Membership checker used by the client.
pub struct ReferenceFile<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl ReferenceFile<File> {
    /// Open the file replies are checked against.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(File::open(path).await?))
    }
}

impl<R: AsyncRead + AsyncSeek + Unpin> ReferenceFile<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::with_capacity(128),
        }
    }

    /// Scan the file from the top for a line equal to `reply`.
    ///
    /// `reply` is a lowercased payload including its trailing newline; each
    /// file line is compared with a newline appended. Order is not checked,
    /// any matching line counts.
    pub async fn check(&mut self, reply: &[u8]) -> std::io::Result<Verdict> {
        self.reader.seek(SeekFrom::Start(0)).await?;

        while read_line(&mut self.reader, &mut self.buf).await? {
            self.buf.push(b'\n');
            if self.buf == reply {
                return Ok(Verdict::Ok);
            }
        }

        Ok(Verdict::Missing)
    }
}
