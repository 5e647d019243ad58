//! Single-connection line server.
//!
//! Binds, accepts exactly one client, and answers its LINE requests from
//! the file until the client quits or hangs up. No further connections are
//! accepted afterwards.

use crate::config::ServerConfig;
use crate::lines::LineSource;
use crate::protocol::{Request, Response, RECV_SIZE};
use std::io;
use std::net::SocketAddr;
use tokio::fs::File;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncSeek, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpListener;
use tracing::{debug, info, trace, warn};

/// The one client the server will ever talk to
const LISTEN_BACKLOG: i32 = 1;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client sent the quit token
    Quit,
    /// Client closed the connection
    PeerClosed,
    /// A LINE request arrived but the file has no lines
    EmptyFile,
}

/// Server instance
pub struct Server {
    listener: TcpListener,
    source: LineSource<File>,
}

impl Server {
    /// Open the file and bind the listener. Both failures are fatal.
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        let source = LineSource::open(&config.file).await?;

        let addr = tokio::net::lookup_host(config.address())
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no address for {}", config.address()),
                )
            })?;
        let listener = TcpListener::from_std(create_listener(addr)?)?;

        Ok(Server { listener, source })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept one connection and serve it to completion.
    pub async fn run(self) -> io::Result<SessionEnd> {
        let Server {
            listener,
            mut source,
        } = self;
        info!(address = %listener.local_addr()?, "Server listening");

        let (stream, peer) = listener.accept().await?;
        drop(listener);
        info!(%peer, "Client connected");

        let end = handle_connection(stream, &mut source).await?;
        info!(%peer, reason = ?end, "Session closed");
        Ok(end)
    }
}

/// Create a listening socket with a backlog of one.
fn create_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}

/// Read one newline-framed request of at most `RECV_SIZE` bytes.
///
/// A longer frame is kept truncated, so it classifies as unknown, and the
/// rest of it is drained up to its newline. Returns false once the client
/// has closed.
async fn read_frame<S>(stream: &mut BufReader<S>, message: &mut Vec<u8>) -> io::Result<bool>
where
    S: AsyncRead + Unpin,
{
    message.clear();
    let limit = RECV_SIZE as u64;

    if (&mut *stream).take(limit).read_until(b'\n', message).await? == 0 {
        return Ok(false);
    }

    if message.len() == RECV_SIZE && message.last() != Some(&b'\n') {
        let mut discard = Vec::with_capacity(RECV_SIZE);
        loop {
            discard.clear();
            let n = (&mut *stream).take(limit).read_until(b'\n', &mut discard).await?;
            if n == 0 || discard.last() == Some(&b'\n') {
                break;
            }
        }
        debug!("Dropped oversized frame");
    }

    Ok(true)
}

/// Serve one client until quit, hang-up, or an empty file.
///
/// Each newline-framed message is handled on its own. Messages other than
/// LINE and the quit token get no reply.
pub async fn handle_connection<S, R>(
    stream: S,
    source: &mut LineSource<R>,
) -> io::Result<SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: AsyncRead + AsyncSeek + Unpin,
{
    let mut stream = BufReader::new(stream);
    let mut message = Vec::with_capacity(RECV_SIZE);

    loop {
        if !read_frame(&mut stream, &mut message).await? {
            trace!("Connection closed by client");
            return Ok(SessionEnd::PeerClosed);
        }

        match Request::parse(&message) {
            Request::Line => {
                let Some(line) = source.next_line().await? else {
                    warn!("LINE requested but the file has no lines");
                    return Ok(SessionEnd::EmptyFile);
                };
                let response = Response::line(&line);
                trace!(len = response.len(), "Sending line");
                stream.write_all(&response).await?;
                stream.flush().await?;
            }
            Request::Quit => {
                debug!("Quit received");
                if let Err(e) = stream.shutdown().await {
                    debug!(error = %e, "Shutdown after quit failed");
                }
                return Ok(SessionEnd::Quit);
            }
            Request::Unknown => {
                let text = String::from_utf8_lossy(&message);
                debug!(message = %text.trim_end(), "Ignoring message");
            }
        }
    }
}
