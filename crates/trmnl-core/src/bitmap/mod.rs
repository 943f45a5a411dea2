//! Bitmap module: decoding completed frames and repacking them for display.

pub mod decoder;
pub mod device;
pub mod encoder;

pub use decoder::{decode, row_stride_in, BitmapHeader, DecodeError, DecodedBitmap};
pub use device::{build, row_stride_out, BuildError, DeviceBitmap, BLANK_FILL};
pub use encoder::{encode_monochrome, EncodeError};
