//! Wire layout of a TRMNL frame and bounds-checked field accessors.
//!
//! Wire format (all multi-byte integers are little-endian):
//! ```text
//! offset  size  field
//!      0     2  signature "BM"
//!      2     4  declared total frame size (0 = unknown)
//!      6     4  reserved
//!     10     4  pixel data offset
//!     14     4  info header size
//!     18     4  width  (i32)
//!     22     4  height (i32, rows stored bottom-up)
//!     26     2  colour planes
//!     28     2  bit depth (must be 1)
//! ```
//! Total header size: 54 bytes (14-byte file header + 40-byte info header).

use thiserror::Error;

/// Two-byte magic at the start of every frame.
pub const SIGNATURE: [u8; 2] = *b"BM";

/// Size of the primary (file) header.  The declared frame size is readable
/// once this many bytes have arrived.
pub const FILE_HEADER_SIZE: usize = 14;

/// Size of the secondary (info) header written by the encoder.
pub const INFO_HEADER_SIZE: usize = 40;

/// Minimum combined header size of a decodable frame.
pub const MIN_FRAME_SIZE: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

/// Byte offsets of the header fields.
pub mod offset {
    pub const SIGNATURE: usize = 0;
    pub const DECLARED_SIZE: usize = 2;
    pub const RESERVED: usize = 6;
    pub const PIXEL_DATA_OFFSET: usize = 10;
    pub const INFO_HEADER_SIZE: usize = 14;
    pub const WIDTH: usize = 18;
    pub const HEIGHT: usize = 22;
    pub const PLANES: usize = 26;
    pub const BIT_DEPTH: usize = 28;
    pub const IMAGE_SIZE: usize = 34;
    pub const COLORS_USED: usize = 46;
}

/// A fixed-width field does not fit inside the buffer.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("field of {width} bytes at offset {offset} exceeds buffer of {available} bytes")]
pub struct OutOfBounds {
    pub offset: usize,
    pub width: usize,
    pub available: usize,
}

fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], OutOfBounds> {
    offset
        .checked_add(N)
        .and_then(|end| buf.get(offset..end))
        .and_then(|field| field.try_into().ok())
        .ok_or(OutOfBounds {
            offset,
            width: N,
            available: buf.len(),
        })
}

/// Reads a little-endian `u16` at `offset`.
///
/// # Errors
///
/// Returns [`OutOfBounds`] if `offset + 2` exceeds the buffer.
pub fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16, OutOfBounds> {
    read_array(buf, offset).map(u16::from_le_bytes)
}

/// Reads a little-endian `u32` at `offset`.
///
/// # Errors
///
/// Returns [`OutOfBounds`] if `offset + 4` exceeds the buffer.
pub fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32, OutOfBounds> {
    read_array(buf, offset).map(u32::from_le_bytes)
}

/// Reads a little-endian `i32` at `offset`.
///
/// # Errors
///
/// Returns [`OutOfBounds`] if `offset + 4` exceeds the buffer.
pub fn read_i32_le(buf: &[u8], offset: usize) -> Result<i32, OutOfBounds> {
    read_array(buf, offset).map(i32::from_le_bytes)
}

/// Returns the declared total frame size, or `None` while fewer than
/// [`FILE_HEADER_SIZE`] bytes are available.
pub fn declared_frame_size(buf: &[u8]) -> Option<u32> {
    if buf.len() < FILE_HEADER_SIZE {
        return None;
    }
    read_u32_le(buf, offset::DECLARED_SIZE).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le_decodes_little_endian() {
        assert_eq!(read_u16_le(&[0x01, 0x02], 0), Ok(0x0201));
    }

    #[test]
    fn test_read_u32_le_at_offset() {
        let buf = [0xFF, 0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u32_le(&buf, 1), Ok(0x1234_5678));
    }

    #[test]
    fn test_read_i32_le_negative_value() {
        let buf = (-42i32).to_le_bytes();
        assert_eq!(read_i32_le(&buf, 0), Ok(-42));
    }

    #[test]
    fn test_read_past_end_returns_out_of_bounds() {
        let buf = [0u8; 5];
        assert_eq!(
            read_u32_le(&buf, 2),
            Err(OutOfBounds {
                offset: 2,
                width: 4,
                available: 5
            })
        );
    }

    #[test]
    fn test_read_with_overflowing_offset_returns_out_of_bounds() {
        let buf = [0u8; 8];
        assert!(read_u16_le(&buf, usize::MAX).is_err());
    }

    #[test]
    fn test_declared_frame_size_unknown_below_file_header() {
        let mut buf = vec![0u8; FILE_HEADER_SIZE - 1];
        buf[2..6].copy_from_slice(&62u32.to_le_bytes());
        assert_eq!(declared_frame_size(&buf), None);
    }

    #[test]
    fn test_declared_frame_size_read_once_file_header_present() {
        let mut buf = vec![0u8; FILE_HEADER_SIZE];
        buf[2..6].copy_from_slice(&62u32.to_le_bytes());
        assert_eq!(declared_frame_size(&buf), Some(62));
    }

    #[test]
    fn test_min_frame_size_is_54_bytes() {
        assert_eq!(MIN_FRAME_SIZE, 54);
    }
}
