//! Domain types shared by the protocol, bitmap and presentation layers.

pub mod placement;

pub use placement::{Anchor, Bounds, Origin};
