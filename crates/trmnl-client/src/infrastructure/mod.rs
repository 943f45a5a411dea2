//! Infrastructure layer for the client application.
//!
//! Contains the OS-facing adapters: TCP network I/O, the in-memory display
//! surface and the TOML configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and `trmnl_core`,
//! but MUST NOT be imported by the `application` layer (tests excepted).
//!
//! # Sub-modules
//!
//! - **`network`** – `TcpConnector` and `TcpByteSink`, the blocking TCP
//!   implementations of the `Connector` and `ByteSink` seams.  A scripted
//!   `ScriptedConnector` is also provided for tests.
//!
//! - **`presenter`** – `MonochromeSurface`, a 1-bit framebuffer with
//!   clipped blits and Netpbm export, and `SurfacePresenter`, which
//!   implements the `Presenter` seam on top of it.
//!
//! - **`scheduler`** – the tokio refresh loop: interval ticks, refreshes on
//!   the blocking pool, and a shutdown future polled even mid-fetch.
//!
//! - **`storage`** – `config.toml` loading with serde defaults and
//!   validation.

pub mod network;
pub mod presenter;
pub mod scheduler;
pub mod storage;
