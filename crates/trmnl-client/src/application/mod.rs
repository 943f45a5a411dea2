//! Application layer use cases for the client application.
//!
//! - **`fetch_image`** – Opens one connection through an injected
//!   `Connector`, receives one frame with `trmnl_core::receive`, decodes it
//!   and repacks it into a `DeviceBitmap`.
//!
//! - **`display_image`** – Computes the image origin from the configured
//!   `Anchor` and hands the bitmap to an injected `Presenter`.
//!
//! - **`refresh_image`** – Combines the two: every refresh is a new
//!   connection, and a failed fetch leaves the previous image on screen.

pub mod display_image;
pub mod fetch_image;
pub mod refresh_image;
