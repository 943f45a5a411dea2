//! Protocol module: wire-field accessors, the transport seam and the frame
//! accumulator.

pub mod accumulator;
pub mod sink;
pub mod wire;

pub use accumulator::{receive, Completion, FrameAccumulator, FrameBuffer, FrameError, Progress};
pub use sink::{ByteSink, ChunkRead, ScriptedSink, SinkError};
pub use wire::OutOfBounds;
