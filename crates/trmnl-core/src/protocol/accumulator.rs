//! Frame accumulator: turns a stream of chunks into one complete frame.
//!
//! A frame is complete when the first of these happens:
//!
//! 1. the declared size in the header (offset 2) is non-zero, fits the
//!    capacity, and that many bytes have arrived;
//! 2. the peer closes the connection;
//! 3. the buffer reaches its capacity.
//!
//! The declared size is only read once [`FILE_HEADER_SIZE`] bytes are
//! present and is never re-read afterwards.  A declared size of zero or one
//! larger than the capacity is kept but ignored, so servers that omit or
//! misreport it still work through the close-triggered completion.

use std::fmt;
use std::io;
use std::ops::Deref;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::sink::{ByteSink, ChunkRead, SinkError};
use crate::protocol::wire::{declared_frame_size, FILE_HEADER_SIZE};

/// Errors that abort a receive.  No partial buffer is returned.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A capacity of zero bytes cannot hold any frame.
    #[error("frame capacity must be greater than zero")]
    InvalidCapacity,

    /// The frame buffer could not be allocated.
    #[error("could not allocate a frame buffer of {requested} bytes")]
    OutOfMemory { requested: usize },

    /// The peer closed before sending a single byte.
    #[error("connection closed before any data arrived")]
    ClosedBeforeData,

    /// A chunk read timed out.
    #[error("timed out after {timeout:?} waiting for data ({received} bytes received)")]
    Timeout { timeout: Duration, received: usize },

    /// A chunk read failed.
    #[error("transport error after {received} bytes: {source}")]
    Transport {
        received: usize,
        #[source]
        source: io::Error,
    },
}

/// Why the accumulator decided the frame was complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The header's declared size was reached.
    DeclaredSize,
    /// The peer closed the connection.
    PeerClosed,
    /// The buffer filled up without any other completion signal.
    CapacityReached,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Completion::DeclaredSize => "declared size reached",
            Completion::PeerClosed => "peer closed",
            Completion::CapacityReached => "capacity reached",
        })
    }
}

/// A complete frame as received from the wire.
///
/// Dereferences to the received bytes; `len() <= capacity()` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    completion: Completion,
}

impl FrameBuffer {
    /// The configured upper bound the frame was received against.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl Deref for FrameBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for FrameBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// What the header has told us so far about the frame length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclaredSize {
    /// Fewer than 14 bytes received.
    Pending,
    /// Usable as a completion signal.
    Trusted(u32),
    /// Zero or larger than the capacity; completion falls back to close.
    Untrusted(u32),
}

/// Outcome of committing one chunk to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More bytes are needed.
    Incomplete,
    /// The frame is complete.
    Complete(Completion),
}

/// Incremental receive state for a single frame.
///
/// [`receive`] drives this against a [`ByteSink`]; it is exposed so callers
/// with their own read loop can reuse the completion rules.
#[derive(Debug)]
pub struct FrameAccumulator {
    buf: Vec<u8>,
    len: usize,
    declared: DeclaredSize,
}

impl FrameAccumulator {
    /// Allocates a zeroed buffer of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidCapacity`] for a zero capacity and
    /// [`FrameError::OutOfMemory`] if the allocation fails.
    pub fn new(capacity: usize) -> Result<Self, FrameError> {
        if capacity == 0 {
            return Err(FrameError::InvalidCapacity);
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| FrameError::OutOfMemory { requested: capacity })?;
        buf.resize(capacity, 0);
        Ok(Self {
            buf,
            len: 0,
            declared: DeclaredSize::Pending,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes received so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The size field from the header, once it has been read.
    pub fn declared_size(&self) -> Option<u32> {
        match self.declared {
            DeclaredSize::Pending => None,
            DeclaredSize::Trusted(size) | DeclaredSize::Untrusted(size) => Some(size),
        }
    }

    /// The unfilled tail of the buffer, `capacity - len` bytes long.
    pub fn spare(&mut self) -> &mut [u8] {
        &mut self.buf[self.len..]
    }

    /// Records that `n` more bytes were written into [`Self::spare`].
    ///
    /// `n` is clamped to the spare length so `len <= capacity` holds.
    pub fn commit(&mut self, n: usize) -> Progress {
        self.len += n.min(self.buf.len() - self.len);

        if self.declared == DeclaredSize::Pending && self.len >= FILE_HEADER_SIZE {
            if let Some(size) = declared_frame_size(&self.buf[..self.len]) {
                self.declared = if size > 0 && size as usize <= self.buf.len() {
                    DeclaredSize::Trusted(size)
                } else {
                    DeclaredSize::Untrusted(size)
                };
            }
        }

        match self.declared {
            DeclaredSize::Trusted(size) if self.len >= size as usize => {
                Progress::Complete(Completion::DeclaredSize)
            }
            _ if self.len == self.buf.len() => Progress::Complete(Completion::CapacityReached),
            _ => Progress::Incomplete,
        }
    }

    /// Consumes the accumulator, keeping only the received bytes.
    pub fn finish(mut self, completion: Completion) -> FrameBuffer {
        let capacity = self.buf.len();
        self.buf.truncate(self.len);
        FrameBuffer {
            bytes: self.buf,
            capacity,
            completion,
        }
    }
}

/// Receives one frame from `sink`.
///
/// Each chunk read asks for at most `capacity - len` bytes and is bounded by
/// `per_chunk_timeout`; there is no overall deadline.
///
/// # Errors
///
/// Returns [`FrameError`] on allocation failure, a close before any data,
/// a chunk timeout, or a transport failure.  Nothing is retried.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use trmnl_core::protocol::{receive, Completion, ScriptedSink};
///
/// let mut sink = ScriptedSink::new().bytes(vec![0x42; 13]).close();
/// let frame = receive(&mut sink, 65536, Duration::from_secs(60)).unwrap();
/// assert_eq!(frame.len(), 13);
/// assert_eq!(frame.completion(), Completion::PeerClosed);
/// ```
pub fn receive<S: ByteSink + ?Sized>(
    sink: &mut S,
    capacity: usize,
    per_chunk_timeout: Duration,
) -> Result<FrameBuffer, FrameError> {
    let mut acc = FrameAccumulator::new(capacity)?;

    loop {
        let read = sink.read_chunk(acc.spare(), per_chunk_timeout);
        match read {
            Ok(ChunkRead::Data(n)) if n > 0 => {
                if let Progress::Complete(completion) = acc.commit(n) {
                    return Ok(acc.finish(completion));
                }
            }
            Ok(ChunkRead::Data(_)) | Ok(ChunkRead::Closed) => {
                if acc.is_empty() {
                    return Err(FrameError::ClosedBeforeData);
                }
                return Ok(acc.finish(Completion::PeerClosed));
            }
            Err(SinkError::Timeout(timeout)) => {
                return Err(FrameError::Timeout {
                    timeout,
                    received: acc.len(),
                });
            }
            Err(SinkError::Transport(source)) => {
                return Err(FrameError::Transport {
                    received: acc.len(),
                    source,
                });
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::sink::{MockByteSink, ScriptedSink};

    const TIMEOUT: Duration = Duration::from_secs(60);

    /// A frame of `total` bytes whose header declares `declared`.
    fn frame_declaring(declared: u32, total: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; total];
        bytes[0] = b'B';
        bytes[1] = b'M';
        if total >= 6 {
            bytes[2..6].copy_from_slice(&declared.to_le_bytes());
        }
        for (i, b) in bytes.iter_mut().enumerate().skip(6) {
            *b = i as u8;
        }
        bytes
    }

    // ── Declared-size completion ─────────────────────────────────────────────

    #[test]
    fn test_completes_when_declared_size_reached_in_one_chunk() {
        // Arrange
        let data = frame_declaring(62, 62);
        let mut sink = ScriptedSink::new().bytes(data.clone());

        // Act
        let frame = receive(&mut sink, 65536, TIMEOUT).unwrap();

        // Assert
        assert_eq!(frame.as_slice(), &data[..]);
        assert_eq!(frame.completion(), Completion::DeclaredSize);
        assert_eq!(sink.calls(), 1, "no read after completion");
    }

    #[test]
    fn test_completes_when_declared_size_reached_across_small_chunks() {
        // Arrange – header straddles several chunks
        let data = frame_declaring(200, 200);
        let mut sink = ScriptedSink::new().chunked(&data, 5).bytes(vec![0xEE; 10]);

        // Act
        let frame = receive(&mut sink, 4096, TIMEOUT).unwrap();

        // Assert
        assert_eq!(frame.len(), 200);
        assert_eq!(frame.completion(), Completion::DeclaredSize);
        assert_eq!(sink.remaining(), 1, "trailing step must not be consumed");
    }

    #[test]
    fn test_keeps_overshoot_bytes_of_final_chunk() {
        // Arrange – the final chunk carries bytes past the declared size
        let mut data = frame_declaring(60, 60);
        data.extend_from_slice(&[0xAB; 6]);
        let mut sink = ScriptedSink::new().bytes(data);

        // Act
        let frame = receive(&mut sink, 4096, TIMEOUT).unwrap();

        // Assert
        assert_eq!(frame.len(), 66);
        assert_eq!(frame.completion(), Completion::DeclaredSize);
    }

    #[test]
    fn test_requests_at_most_remaining_capacity() {
        // Arrange
        let data = frame_declaring(0, 30);
        let mut sink = ScriptedSink::new().bytes(data[..10].to_vec()).bytes(data[10..].to_vec()).close();

        // Act
        receive(&mut sink, 100, TIMEOUT).unwrap();

        // Assert
        assert_eq!(sink.requested, vec![100, 90, 70]);
    }

    // ── Close-triggered completion ───────────────────────────────────────────

    #[test]
    fn test_thirteen_bytes_then_close_is_complete_frame() {
        // Arrange
        let mut sink = ScriptedSink::new().bytes(vec![0x42; 13]).close();

        // Act
        let frame = receive(&mut sink, 65536, TIMEOUT).unwrap();

        // Assert
        assert_eq!(frame.len(), 13);
        assert_eq!(frame.completion(), Completion::PeerClosed);
    }

    #[test]
    fn test_zero_declared_size_completes_only_on_close() {
        // Arrange – 62 bytes of a frame whose size field is 0
        let data = frame_declaring(0, 62);
        let mut sink = ScriptedSink::new().chunked(&data, 20).close();

        // Act
        let frame = receive(&mut sink, 65536, TIMEOUT).unwrap();

        // Assert
        assert_eq!(frame.len(), 62);
        assert_eq!(frame.completion(), Completion::PeerClosed);
        assert_eq!(sink.calls(), 5, "four data chunks and the close");
    }

    #[test]
    fn test_declared_size_larger_than_capacity_falls_back_to_close() {
        let data = frame_declaring(1_000_000, 80);
        let mut sink = ScriptedSink::new().bytes(data).close();

        let frame = receive(&mut sink, 4096, TIMEOUT).unwrap();

        assert_eq!(frame.len(), 80);
        assert_eq!(frame.completion(), Completion::PeerClosed);
    }

    #[test]
    fn test_declared_size_not_yet_reached_when_peer_closes() {
        // Arrange – declares 500 bytes but sends 100
        let data = frame_declaring(500, 100);
        let mut sink = ScriptedSink::new().bytes(data).close();

        // Act
        let frame = receive(&mut sink, 4096, TIMEOUT).unwrap();

        // Assert
        assert_eq!(frame.len(), 100);
        assert_eq!(frame.completion(), Completion::PeerClosed);
    }

    #[test]
    fn test_zero_length_data_is_treated_as_close() {
        let mut sink = MockByteSink::new();
        let mut seq = mockall::Sequence::new();
        sink.expect_read_chunk()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|buf, _| {
                buf[..4].copy_from_slice(b"BMxx");
                Ok(ChunkRead::Data(4))
            });
        sink.expect_read_chunk()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(ChunkRead::Data(0)));

        let frame = receive(&mut sink, 64, TIMEOUT).unwrap();

        assert_eq!(&frame[..], b"BMxx");
        assert_eq!(frame.completion(), Completion::PeerClosed);
    }

    #[test]
    fn test_close_before_any_data_is_error() {
        let mut sink = ScriptedSink::new().close();
        let result = receive(&mut sink, 65536, TIMEOUT);
        assert!(matches!(result, Err(FrameError::ClosedBeforeData)));
    }

    // ── Capacity completion ──────────────────────────────────────────────────

    #[test]
    fn test_capacity_reached_without_completion_returns_buffer() {
        // Arrange – size field 0, server keeps sending
        let data = frame_declaring(0, 300);
        let mut sink = ScriptedSink::new().chunked(&data, 64);

        // Act
        let frame = receive(&mut sink, 128, TIMEOUT).unwrap();

        // Assert
        assert_eq!(frame.len(), 128);
        assert_eq!(frame.capacity(), 128);
        assert_eq!(frame.completion(), Completion::CapacityReached);
        assert_eq!(&frame[..], &data[..128]);
    }

    #[test]
    fn test_declared_size_equal_to_capacity_reports_declared_size() {
        let data = frame_declaring(128, 128);
        let mut sink = ScriptedSink::new().bytes(data);

        let frame = receive(&mut sink, 128, TIMEOUT).unwrap();

        assert_eq!(frame.completion(), Completion::DeclaredSize);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let mut sink = ScriptedSink::new();
        assert!(matches!(receive(&mut sink, 0, TIMEOUT), Err(FrameError::InvalidCapacity)));
        assert_eq!(sink.calls(), 0);
    }

    // ── Failures ─────────────────────────────────────────────────────────────

    #[test]
    fn test_timeout_aborts_without_partial_frame() {
        // Arrange
        let data = frame_declaring(500, 100);
        let mut sink = ScriptedSink::new().bytes(data).timeout();

        // Act
        let result = receive(&mut sink, 4096, TIMEOUT);

        // Assert
        match result {
            Err(FrameError::Timeout { timeout, received }) => {
                assert_eq!(timeout, TIMEOUT);
                assert_eq!(received, 100);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_transport_error_aborts() {
        let mut sink = ScriptedSink::new()
            .bytes(vec![b'B', b'M'])
            .fail(io::ErrorKind::BrokenPipe);

        let result = receive(&mut sink, 4096, TIMEOUT);

        assert!(matches!(
            result,
            Err(FrameError::Transport { received: 2, ref source }) if source.kind() == io::ErrorKind::BrokenPipe
        ));
    }

    #[test]
    fn test_passes_per_chunk_timeout_to_sink() {
        let mut sink = MockByteSink::new();
        sink.expect_read_chunk()
            .withf(|buf, timeout| buf.len() == 32 && *timeout == Duration::from_secs(7))
            .times(1)
            .returning(|_, _| Ok(ChunkRead::Closed));

        let result = receive(&mut sink, 32, Duration::from_secs(7));

        assert!(matches!(result, Err(FrameError::ClosedBeforeData)));
    }

    // ── FrameAccumulator ─────────────────────────────────────────────────────

    #[test]
    fn test_declared_size_is_read_once_and_kept() {
        // Arrange
        let mut acc = FrameAccumulator::new(1024).unwrap();
        let data = frame_declaring(40, 40);
        acc.spare()[..14].copy_from_slice(&data[..14]);
        assert_eq!(acc.commit(14), Progress::Incomplete);

        // Act – the size field now claims 1000 bytes, which would still fit
        acc.buf[2..6].copy_from_slice(&1000u32.to_le_bytes());
        acc.spare()[..26].copy_from_slice(&data[14..]);
        let progress = acc.commit(26);

        // Assert
        assert_eq!(progress, Progress::Complete(Completion::DeclaredSize));
        assert_eq!(acc.len(), 40);
        assert_eq!(acc.declared_size(), Some(40));
    }

    #[test]
    fn test_unallocatable_capacity_is_out_of_memory() {
        // Arrange
        let mut sink = ScriptedSink::new().bytes(frame_declaring(62, 62));

        // Act
        let result = receive(&mut sink, usize::MAX, TIMEOUT);

        // Assert
        assert!(matches!(
            result,
            Err(FrameError::OutOfMemory { requested }) if requested == usize::MAX
        ));
        assert_eq!(sink.calls(), 0, "no read without a buffer");
    }

    #[test]
    fn test_declared_size_unknown_below_fourteen_bytes() {
        let mut acc = FrameAccumulator::new(1024).unwrap();
        acc.spare()[..13].copy_from_slice(&frame_declaring(20, 13));
        assert_eq!(acc.commit(13), Progress::Incomplete);
        assert_eq!(acc.declared_size(), None);
    }

    #[test]
    fn test_commit_clamps_to_capacity() {
        let mut acc = FrameAccumulator::new(16).unwrap();
        let progress = acc.commit(100);
        assert_eq!(acc.len(), 16);
        assert_eq!(progress, Progress::Complete(Completion::CapacityReached));
    }
}
