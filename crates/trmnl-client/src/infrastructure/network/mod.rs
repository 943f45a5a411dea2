//! Network infrastructure for the client application.
//!
//! Provides the TCP implementation of the [`Connector`] and [`ByteSink`]
//! seams.  Both are plain blocking `std::net` sockets: a fetch is one
//! short-lived connection read with per-call timeouts, and the async
//! application runs it on a blocking worker thread.
//!
//! Architecture:
//! - `TcpConnector` resolves the endpoint and tries each address in turn
//!   with `TcpStream::connect_timeout`.
//! - `TcpByteSink` owns the stream and maps each `read` outcome onto the
//!   sink contract: data, peer closed, timeout or transport failure.
//! - No request bytes are ever written; the server speaks first.

pub mod mock;

use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;
use trmnl_core::{ByteSink, ChunkRead, SinkError};

use crate::application::fetch_image::{ConnectError, Connector, Endpoint};

/// Smallest read timeout handed to the OS; a zero timeout means "block
/// forever" to `set_read_timeout` and is rejected by it.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Connects to the image server over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Sink = TcpByteSink;

    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<TcpByteSink, ConnectError> {
        let addrs: Vec<SocketAddr> = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|source| ConnectError::Resolve {
                host: endpoint.host.clone(),
                source,
            })?
            .collect();

        let timeout = timeout.max(MIN_READ_TIMEOUT);
        let mut last_error = None;
        for addr in addrs {
            debug!("connecting to {addr} (timeout {timeout:?})");
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(TcpByteSink::new(stream, addr)),
                Err(e) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {
                    last_error = Some(ConnectError::TimedOut { addr, timeout });
                }
                Err(source) => {
                    last_error = Some(ConnectError::Failed { addr, source });
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ConnectError::NoAddress {
            host: endpoint.host.clone(),
        }))
    }
}

/// A connected TCP stream read through the [`ByteSink`] contract.
///
/// Dropping the sink closes the connection.
#[derive(Debug)]
pub struct TcpByteSink {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpByteSink {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl ByteSink for TcpByteSink {
    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ChunkRead, SinkError> {
        self.stream.set_read_timeout(Some(timeout.max(MIN_READ_TIMEOUT)))?;

        loop {
            match self.stream.read(buf) {
                Ok(0) => return Ok(ChunkRead::Closed),
                Ok(n) => return Ok(ChunkRead::Data(n)),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // Unix reports an expired read timeout as WouldBlock,
                // Windows as TimedOut.
                Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                    return Err(SinkError::Timeout(timeout));
                }
                Err(e)
                    if e.kind() == io::ErrorKind::ConnectionReset
                        || e.kind() == io::ErrorKind::ConnectionAborted =>
                {
                    debug!("{} closed the connection abruptly: {e}", self.peer);
                    return Ok(ChunkRead::Closed);
                }
                Err(e) => return Err(SinkError::Transport(e)),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Binds a listener on an ephemeral loopback port and runs `serve` on
    /// the first accepted connection.
    fn serve_once<F>(serve: F) -> (Endpoint, thread::JoinHandle<()>)
    where
        F: FnOnce(TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream);
        });
        (Endpoint::new("127.0.0.1", port), handle)
    }

    #[test]
    fn test_connect_and_read_until_close() {
        // Arrange
        let (endpoint, server) = serve_once(|mut stream| {
            stream.write_all(b"hello").unwrap();
        });

        // Act
        let mut sink = TcpConnector.connect(&endpoint, TIMEOUT).unwrap();
        server.join().unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            match sink.read_chunk(&mut buf, TIMEOUT).unwrap() {
                ChunkRead::Data(n) => received.extend_from_slice(&buf[..n]),
                ChunkRead::Closed => break,
            }
        }

        // Assert
        assert_eq!(received, b"hello");
        assert_eq!(sink.peer().port(), endpoint.port);
    }

    #[test]
    fn test_silent_server_times_out() {
        // Arrange – server holds the connection open without sending
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let (endpoint, server) = serve_once(move |_stream| {
            let _ = release_rx.recv();
        });
        let mut sink = TcpConnector.connect(&endpoint, TIMEOUT).unwrap();

        // Act
        let mut buf = [0u8; 16];
        let result = sink.read_chunk(&mut buf, Duration::from_millis(100));

        // Assert
        assert!(matches!(result, Err(SinkError::Timeout(t)) if t == Duration::from_millis(100)));
        release_tx.send(()).unwrap();
        server.join().unwrap();
    }

    #[test]
    fn test_refused_connection_is_failed() {
        // Arrange – bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        // Act
        let result = TcpConnector.connect(&Endpoint::new("127.0.0.1", port), TIMEOUT);

        // Assert
        assert!(matches!(result, Err(ConnectError::Failed { .. })));
    }

    #[test]
    fn test_unresolvable_host_is_resolve_error() {
        // interior NUL is rejected before any lookup is attempted
        let result = TcpConnector.connect(&Endpoint::new("bad\0host", 1337), TIMEOUT);
        assert!(matches!(result, Err(ConnectError::Resolve { .. })));
    }
}
