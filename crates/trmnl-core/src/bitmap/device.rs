//! Device bitmap builder.
//!
//! The display surface wants rows top-down, padded to a 16-bit word, with
//! the opposite bit polarity to the wire format.  [`build`] performs the
//! vertical flip and the inversion in one pass.

use thiserror::Error;

use crate::bitmap::decoder::DecodedBitmap;
use crate::domain::placement::Bounds;

/// Value every output byte starts with before rows are copied in.
pub const BLANK_FILL: u8 = 0xFF;

/// Errors returned by [`build`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// The output buffer could not be allocated.
    #[error("could not allocate a device bitmap of {requested} bytes")]
    OutOfMemory { requested: usize },

    /// `row_stride * height` does not fit in memory addressing.
    #[error("device bitmap of {width}x{height} is too large")]
    SizeOverflow { width: u32, height: u32 },
}

/// Bytes per output row: `((width + 15) / 16) * 2`.
pub fn row_stride_out(width: u32) -> usize {
    (width as usize).div_ceil(16) * 2
}

/// A bitmap in the display surface's native layout.
///
/// One bit per pixel, most significant bit leftmost, rows top-down, each row
/// `row_stride` bytes long.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceBitmap {
    row_stride: usize,
    bounds: Bounds,
    pixels: Vec<u8>,
}

impl DeviceBitmap {
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Output row `y`, counted from the top.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let start = (y as usize).checked_mul(self.row_stride)?;
        self.pixels.get(start..start.checked_add(self.row_stride)?)
    }

    /// Whether the bit for pixel `(x, y)` is set.  Out-of-range pixels read
    /// as unset.
    pub fn bit(&self, x: u32, y: u32) -> bool {
        if x >= self.bounds.width {
            return false;
        }
        self.row(y)
            .map(|row| row[x as usize / 8] & (0x80 >> (x % 8)) != 0)
            .unwrap_or(false)
    }
}

/// Repacks a decoded bitmap for the display surface.
///
/// Output row `r` is source row `height - 1 - r`, every copied byte is
/// inverted, and `min(source stride, output stride)` bytes are copied per
/// row.  Bytes not copied keep [`BLANK_FILL`].  Calling this twice on the
/// same input yields identical output.
///
/// # Errors
///
/// Returns [`BuildError::SizeOverflow`] or [`BuildError::OutOfMemory`] when
/// the output buffer cannot be allocated.
///
/// # Examples
///
/// ```
/// use trmnl_core::bitmap::{build, decode, encoder::encode_monochrome};
///
/// let frame = encode_monochrome(8, 1, &[vec![0xAA]]).unwrap();
/// let device = build(&decode(&frame).unwrap()).unwrap();
/// assert_eq!(device.pixels(), &[0x55, 0xFF]);
/// ```
pub fn build(decoded: &DecodedBitmap<'_>) -> Result<DeviceBitmap, BuildError> {
    let width = decoded.width();
    let height = decoded.height();
    let row_stride = row_stride_out(width);

    let total = row_stride
        .checked_mul(height as usize)
        .ok_or(BuildError::SizeOverflow { width, height })?;

    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(total)
        .map_err(|_| BuildError::OutOfMemory { requested: total })?;
    pixels.resize(total, BLANK_FILL);

    let copy_len = decoded.row_stride().min(row_stride);
    if copy_len > 0 {
        for (r, dest) in pixels.chunks_exact_mut(row_stride).enumerate() {
            let src_index = height as usize - 1 - r;
            let Some(src) = decoded.row(src_index) else {
                break;
            };
            for (d, s) in dest[..copy_len].iter_mut().zip(&src[..copy_len]) {
                *d = !*s;
            }
        }
    }

    Ok(DeviceBitmap {
        row_stride,
        bounds: Bounds { width, height },
        pixels,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
