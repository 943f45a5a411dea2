//! FetchImageUseCase: one connection, one frame, one device bitmap.
//!
//! The use case owns no socket itself.  A [`Connector`] implementation,
//! injected at construction time, opens the connection and hands back a
//! [`ByteSink`]; the infrastructure layer provides the TCP one.
//!
//! # Fetch lifecycle
//!
//! ```text
//! FetchSession::open()  -- Connector::connect, bounded by connect_timeout
//!  └─ receive()         -- trmnl_core::receive, bounded per chunk
//!       └─ (session dropped: connection closed)
//! decode()              -- validate headers, borrow pixel rows
//! build()               -- flip + invert into a DeviceBitmap
//! ```
//!
//! Every failure is returned as-is.  Nothing is retried here; the caller
//! decides whether to fetch again.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};
use trmnl_core::{
    build, decode, receive, BuildError, ByteSink, DecodeError, DeviceBitmap, FrameBuffer,
    FrameError,
};

/// Host and port of the image server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Errors raised while opening the connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The host name could not be resolved.
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// The host name resolved to no addresses.
    #[error("{host} resolved to no addresses")]
    NoAddress { host: String },

    /// No connection was established within the connect timeout.
    #[error("connecting to {addr} timed out after {timeout:?}")]
    TimedOut { addr: SocketAddr, timeout: Duration },

    /// The connection attempt was refused or otherwise failed.
    #[error("failed to connect to {addr}: {source}")]
    Failed {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Opens connections to the image server.
pub trait Connector: Send + Sync {
    /// The byte source handed to the frame accumulator.
    type Sink: ByteSink;

    /// Connects to `endpoint`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] if no connection could be established.
    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<Self::Sink, ConnectError>;
}

/// Everything a single fetch needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub endpoint: Endpoint,
    /// Frame buffer capacity in bytes.
    pub max_frame_size: usize,
    pub connect_timeout: Duration,
    /// Bound on each individual read, not on the whole frame.
    pub chunk_timeout: Duration,
}

/// Error type for a complete fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connect failed: {0}")]
    Connect(#[from] ConnectError),

    #[error("receive failed: {0}")]
    Receive(#[from] FrameError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("device bitmap build failed: {0}")]
    Build(#[from] BuildError),
}

/// An open connection that will deliver exactly one frame.
///
/// Receiving consumes the session, so the connection is closed as soon as
/// the frame is complete or the receive fails.
#[derive(Debug)]
pub struct FetchSession<S: ByteSink> {
    endpoint: Endpoint,
    sink: S,
}

impl<S: ByteSink> FetchSession<S> {
    /// Opens a session through `connector`.
    ///
    /// # Errors
    ///
    /// Returns the connector's [`ConnectError`].
    pub fn open<C>(connector: &C, endpoint: &Endpoint, timeout: Duration) -> Result<Self, ConnectError>
    where
        C: Connector<Sink = S> + ?Sized,
    {
        let sink = connector.connect(endpoint, timeout)?;
        Ok(Self {
            endpoint: endpoint.clone(),
            sink,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Receives the frame and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] from the accumulator.
    pub fn receive(mut self, capacity: usize, chunk_timeout: Duration) -> Result<FrameBuffer, FrameError> {
        receive(&mut self.sink, capacity, chunk_timeout)
    }
}

/// The Fetch Image use case.
pub struct FetchImageUseCase<C: Connector> {
    connector: C,
    settings: FetchSettings,
}

impl<C: Connector> FetchImageUseCase<C> {
    pub fn new(connector: C, settings: FetchSettings) -> Self {
        Self { connector, settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Connects, receives one frame, and turns it into a device bitmap.
    ///
    /// Blocks the calling thread for at most `connect_timeout` plus one
    /// `chunk_timeout` per read.
    ///
    /// # Errors
    ///
    /// Returns the first [`FetchError`] encountered.
    pub fn fetch(&self) -> Result<DeviceBitmap, FetchError> {
        let settings = &self.settings;

        let session = FetchSession::open(&self.connector, &settings.endpoint, settings.connect_timeout)?;
        info!("connected to {}", session.endpoint());

        let frame = session.receive(settings.max_frame_size, settings.chunk_timeout)?;
        debug!(
            "received {} bytes from {} ({})",
            frame.len(),
            settings.endpoint,
            frame.completion()
        );

        let decoded = decode(&frame)?;
        debug!(
            "decoded {}x{} bitmap, source stride {}",
            decoded.width(),
            decoded.height(),
            decoded.row_stride()
        );

        let bitmap = build(&decoded)?;
        info!(
            "fetched {}x{} image from {}",
            bitmap.bounds().width,
            bitmap.bounds().height,
            settings.endpoint
        );
        Ok(bitmap)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
