//! # trmnl-core
//!
//! Shared library for the TRMNL image-fetch client containing the stream
//! framing loop, the monochrome bitmap codec, the device-bitmap repacker and
//! the placement math used to position an image on a display surface.
//!
//! This crate has zero dependencies on OS APIs, sockets, UI frameworks or
//! logging.  The transport is injected through the [`ByteSink`] trait so
//! every piece here can be exercised with in-memory test doubles.
//!
//! # Architecture overview
//!
//! A TRMNL server answers a TCP connection with exactly one frame: a 1-bit
//! bitmap file whose length is written into its own header.  The client
//! connects, passively receives, decodes, and draws.
//!
//! - **`protocol`** – How bytes arrive.  [`receive`] reads chunks from a
//!   [`ByteSink`] until the frame is complete, which happens when the
//!   declared size is reached, when the peer closes, or when the configured
//!   capacity is full.
//!
//! - **`bitmap`** – What the bytes mean.  [`decode`] validates the headers
//!   and returns a borrowed view of the bottom-up pixel rows; [`build`]
//!   repacks them into a top-down, word-aligned, polarity-inverted
//!   [`DeviceBitmap`].
//!
//! - **`domain`** – Where the image goes.  [`Anchor`] turns a surface size
//!   and an image size into the top-left [`Origin`] of the copy.

pub mod bitmap;
pub mod domain;
pub mod protocol;

pub use bitmap::decoder::{decode, row_stride_in, BitmapHeader, DecodeError, DecodedBitmap};
pub use bitmap::device::{build, row_stride_out, BuildError, DeviceBitmap, BLANK_FILL};
pub use domain::placement::{Anchor, Bounds, Origin};
pub use protocol::accumulator::{receive, Completion, FrameBuffer, FrameError};
pub use protocol::sink::{ByteSink, ChunkRead, SinkError};
