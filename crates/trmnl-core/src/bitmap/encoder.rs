//! Monochrome bitmap encoder.
//!
//! Produces frames in exactly the layout [`decode`](crate::bitmap::decode)
//! reads: a 14-byte file header, a 40-byte info header, a two-entry palette
//! (black, white) and DWORD-aligned rows stored bottom-up.  Servers and test
//! fixtures use it to produce frames.

use thiserror::Error;

use crate::bitmap::decoder::{row_stride_in, SUPPORTED_BIT_DEPTH};
use crate::protocol::wire::{offset, INFO_HEADER_SIZE, MIN_FRAME_SIZE, SIGNATURE};

/// Size of the two-entry BGRA palette written after the info header.
pub const PALETTE_SIZE: usize = 8;

/// Offset at which the encoder places the pixel rows.
pub const PIXEL_DATA_OFFSET: usize = MIN_FRAME_SIZE + PALETTE_SIZE;

/// Errors returned by [`encode_monochrome`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("expected {expected} rows, got {actual}")]
    RowCount { expected: usize, actual: usize },

    #[error("row {row} has {actual} bytes, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{width}x{height} bitmap does not fit a 32-bit frame size")]
    TooLarge { width: u32, height: u32 },
}

/// Encodes top-down rows of packed pixels (MSB leftmost, `ceil(width / 8)`
/// bytes each) into a complete frame.
///
/// The declared size at offset 2 is the full frame length.
///
/// # Errors
///
/// Returns [`EncodeError`] if the row count or a row length does not match
/// the dimensions, or the frame would exceed `u32::MAX` bytes.
pub fn encode_monochrome(width: u32, height: u32, rows: &[Vec<u8>]) -> Result<Vec<u8>, EncodeError> {
    if rows.len() != height as usize {
        return Err(EncodeError::RowCount {
            expected: height as usize,
            actual: rows.len(),
        });
    }
    let packed_len = (width as usize).div_ceil(8);
    if let Some((row, bytes)) = rows.iter().enumerate().find(|(_, r)| r.len() != packed_len) {
        return Err(EncodeError::RowLength {
            row,
            expected: packed_len,
            actual: bytes.len(),
        });
    }
    if width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(EncodeError::TooLarge { width, height });
    }

    let stride = row_stride_in(width);
    let total = (stride as u64)
        .checked_mul(u64::from(height))
        .map(|pixels| pixels + PIXEL_DATA_OFFSET as u64)
        .filter(|total| *total <= u64::from(u32::MAX))
        .ok_or(EncodeError::TooLarge { width, height })? as usize;

    let mut buf = vec![0u8; PIXEL_DATA_OFFSET];
    buf[offset::SIGNATURE..offset::SIGNATURE + 2].copy_from_slice(&SIGNATURE);
    put_u32(&mut buf, offset::DECLARED_SIZE, total as u32);
    put_u32(&mut buf, offset::RESERVED, 0);
    put_u32(&mut buf, offset::PIXEL_DATA_OFFSET, PIXEL_DATA_OFFSET as u32);
    put_u32(&mut buf, offset::INFO_HEADER_SIZE, INFO_HEADER_SIZE as u32);
    put_u32(&mut buf, offset::WIDTH, width);
    put_u32(&mut buf, offset::HEIGHT, height);
    buf[offset::PLANES..offset::PLANES + 2].copy_from_slice(&1u16.to_le_bytes());
    buf[offset::BIT_DEPTH..offset::BIT_DEPTH + 2].copy_from_slice(&SUPPORTED_BIT_DEPTH.to_le_bytes());
    put_u32(&mut buf, offset::IMAGE_SIZE, (total - PIXEL_DATA_OFFSET) as u32);
    put_u32(&mut buf, offset::COLORS_USED, 2);
    // palette: index 0 black, index 1 white
    buf[MIN_FRAME_SIZE..PIXEL_DATA_OFFSET].copy_from_slice(&[0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0]);

    buf.reserve_exact(total - PIXEL_DATA_OFFSET);
    for row in rows.iter().rev() {
        buf.extend_from_slice(row);
        buf.resize(buf.len() + stride - row.len(), 0);
    }
    Ok(buf)
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

// ── Tests ─────────────────────────────────────────────────────────────────────
