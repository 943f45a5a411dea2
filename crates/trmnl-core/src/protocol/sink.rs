//! The transport seam: a blocking, timeout-bounded byte source.
//!
//! The accumulator never touches a socket.  It asks a [`ByteSink`] for the
//! next chunk and the caller decides what stands behind it: a TCP stream in
//! the client binary, a [`ScriptedSink`] in tests.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Successful outcome of a single [`ByteSink::read_chunk`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRead {
    /// `n` bytes were written to the front of the caller's buffer.
    Data(usize),
    /// The peer closed the connection (gracefully or otherwise).
    Closed,
}

/// Failure of a single [`ByteSink::read_chunk`] call.
#[derive(Debug, Error)]
pub enum SinkError {
    /// No byte arrived within the per-call timeout.
    #[error("no data within {0:?}")]
    Timeout(Duration),

    /// The transport failed for a reason other than the peer closing.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

/// Blocking byte source used by the frame accumulator.
#[cfg_attr(test, mockall::automock)]
pub trait ByteSink {
    /// Blocks until at least one byte is available, the peer closes, or
    /// `timeout` elapses.  At most `buf.len()` bytes are written.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Timeout`] when nothing arrived in time and
    /// [`SinkError::Transport`] for any other transport failure.
    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ChunkRead, SinkError>;
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ChunkRead, SinkError> {
        (**self).read_chunk(buf, timeout)
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ChunkRead, SinkError> {
        (**self).read_chunk(buf, timeout)
    }
}

// ── Scripted implementation (always compiled for tests) ───────────────────────

/// One scripted transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deliver these bytes.  If the caller's buffer is smaller, the rest is
    /// delivered by the following calls.
    Bytes(Vec<u8>),
    /// Report that the peer closed.
    Close,
    /// Report a timeout.
    Timeout,
    /// Report a transport failure of the given kind.
    Fail(io::ErrorKind),
}

/// A sink that replays a fixed list of [`Step`]s.
///
/// Used in unit tests and integration tests on any platform.  Does not make
/// any OS calls.  Once the script is exhausted every further call reports
/// [`ChunkRead::Closed`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use trmnl_core::protocol::{receive, ScriptedSink};
///
/// let mut sink = ScriptedSink::new().bytes(b"hello".to_vec()).close();
/// let frame = receive(&mut sink, 64, Duration::from_secs(1)).unwrap();
/// assert_eq!(&frame[..], b"hello");
/// ```
#[derive(Debug, Default)]
pub struct ScriptedSink {
    steps: VecDeque<Step>,
    /// Buffer length offered by each call, in order.
    pub requested: Vec<usize>,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a data step.
    pub fn bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.steps.push_back(Step::Bytes(bytes.into()));
        self
    }

    /// Appends `data` split into chunks of at most `chunk` bytes.
    pub fn chunked(mut self, data: &[u8], chunk: usize) -> Self {
        for piece in data.chunks(chunk.max(1)) {
            self.steps.push_back(Step::Bytes(piece.to_vec()));
        }
        self
    }

    pub fn close(mut self) -> Self {
        self.steps.push_back(Step::Close);
        self
    }

    pub fn timeout(mut self) -> Self {
        self.steps.push_back(Step::Timeout);
        self
    }

    pub fn fail(mut self, kind: io::ErrorKind) -> Self {
        self.steps.push_back(Step::Fail(kind));
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.requested.len()
    }

    /// Steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl ByteSink for ScriptedSink {
    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ChunkRead, SinkError> {
        self.requested.push(buf.len());
        match self.steps.pop_front() {
            None | Some(Step::Close) => Ok(ChunkRead::Closed),
            Some(Step::Timeout) => Err(SinkError::Timeout(timeout)),
            Some(Step::Fail(kind)) => Err(SinkError::Transport(io::Error::new(kind, "scripted failure"))),
            Some(Step::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.steps.push_front(Step::Bytes(bytes.split_off(n)));
                }
                Ok(ChunkRead::Data(n))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
