//! Checking client.
//!
//! Asks the server for a line every `interval`, folds each reply to
//! lowercase and reports whether it occurs anywhere in the reference file.
//! Only membership is verified: a reply that skips ahead or repeats still
//! passes as long as the file contains it.

use crate::config::ClientConfig;
use crate::lines::{ReferenceFile, Verdict};
use crate::protocol::{Response, LINE_REQUEST, QUIT_REQUEST, RECV_SIZE};
use std::io::{self, Write};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, trace};

/// Result of a client run
#[derive(Debug, Default)]
pub struct Summary {
    /// One verdict per completed check, in order
    pub verdicts: Vec<Verdict>,
    /// Server hung up before the schedule finished
    pub peer_closed: bool,
}

impl Summary {
    pub fn missing(&self) -> usize {
        self.verdicts.iter().filter(|v| **v == Verdict::Missing).count()
    }
}

/// Client instance
pub struct Client<S, R> {
    stream: S,
    reference: ReferenceFile<R>,
    iterations: u64,
    interval: Duration,
}

impl Client<TcpStream, File> {
    /// Connect to the server, then open the reference file.
    pub async fn connect(config: &ClientConfig) -> io::Result<Self> {
        let stream = TcpStream::connect(config.address()).await?;
        info!(server = %stream.peer_addr()?, "Connected");

        let reference = ReferenceFile::open(&config.file).await?;
        Ok(Self::new(stream, reference, config.iterations(), config.interval))
    }
}

impl<S, R> Client<S, R>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: AsyncRead + AsyncSeek + Unpin,
{
    pub fn new(
        stream: S,
        reference: ReferenceFile<R>,
        iterations: u64,
        interval: Duration,
    ) -> Self {
        Self {
            stream,
            reference,
            iterations,
            interval,
        }
    }

    /// Run every scheduled check, writing one verdict line per check to
    /// `report`, then send the quit token and close.
    pub async fn run<W: Write>(mut self, report: &mut W) -> io::Result<Summary> {
        let mut summary = Summary::default();
        let mut buf = [0u8; RECV_SIZE];
        let mut count = 0;

        while count < self.iterations {
            if let Err(e) = self.stream.write_all(LINE_REQUEST).await {
                if !is_disconnect(&e) {
                    return Err(e);
                }
                debug!(error = %e, "Request failed, server gone");
                summary.peer_closed = true;
                break;
            }

            let n = match self.stream.read(&mut buf).await {
                Ok(n) => n,
                Err(e) if is_disconnect(&e) => 0,
                Err(e) => return Err(e),
            };
            if n == 0 {
                info!(checks = count, "Server closed the connection");
                summary.peer_closed = true;
                break;
            }

            let reply = Response::normalize(&buf[..n]);
            let verdict = self.reference.check(&reply).await?;
            trace!(len = n, %verdict, "Checked reply");

            writeln!(report, "{verdict}")?;
            summary.verdicts.push(verdict);

            count += 1;
            tokio::time::sleep(self.interval).await;
        }

        if let Err(e) = self.stream.write_all(QUIT_REQUEST).await {
            debug!(error = %e, "Quit not delivered");
        }
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "Shutdown failed");
        }

        info!(
            checks = summary.verdicts.len(),
            missing = summary.missing(),
            "Client finished"
        );
        Ok(summary)
    }
}

/// Errors that mean the server went away rather than something broke.
fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
