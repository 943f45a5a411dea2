//! trmnl-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does trmnl-client do?
//!
//! A TRMNL server holds one monochrome image.  Whoever connects to it gets
//! that image as a single 1-bit bitmap file, and nothing else: the client
//! sends no request, the server may close the connection when done.
//!
//! The client application:
//!
//! 1. Reads `config.toml` (server address, receive limits, surface size,
//!    placement, refresh period).
//! 2. Connects over TCP and receives one frame with `trmnl_core::receive`.
//! 3. Decodes the bitmap and repacks it into the surface's native layout.
//! 4. Places it on the display surface, centred or at a fixed offset, and
//!    optionally exports the surface as a Netpbm file.
//! 5. If auto refresh is on, repeats steps 2-4 on a fresh connection every
//!    refresh period, keeping the previous image when a refresh fails.

/// Application layer: use cases for the client.
pub mod application;

/// Infrastructure layer: TCP adapter, display surface, and configuration.
pub mod infrastructure;
