//! Monochrome bitmap decoder.
//!
//! Validates a completed frame and returns a [`DecodedBitmap`] that borrows
//! the pixel rows straight out of the frame; nothing is copied.  Checks run
//! in a fixed order and the first failure is returned.

use thiserror::Error;

use crate::protocol::wire::{
    offset, read_i32_le, read_u16_le, read_u32_le, OutOfBounds, MIN_FRAME_SIZE, SIGNATURE,
};

/// The only bit depth this decoder accepts.
pub const SUPPORTED_BIT_DEPTH: u16 = 1;

/// Errors returned by [`decode`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The frame cannot even hold the combined headers.
    #[error("frame too small: need at least {min} bytes, got {length}", min = MIN_FRAME_SIZE)]
    TooSmall { length: usize },

    /// The first two bytes are not the bitmap magic.
    #[error("bad signature: {0:02X?}")]
    BadSignature([u8; 2]),

    /// The bitmap is not 1 bit per pixel.
    #[error("unsupported bit depth: {0}")]
    UnsupportedDepth(u16),

    /// The pixel region extends past the received bytes.
    #[error("truncated pixel data: need {required} bytes, frame has {available}")]
    Truncated { required: u64, available: usize },

    /// A header field could not be read.
    #[error(transparent)]
    Header(#[from] OutOfBounds),
}

/// Parsed header fields.  Width and height keep their on-wire sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader {
    pub signature: [u8; 2],
    pub declared_size: u32,
    pub pixel_data_offset: u32,
    pub width: i32,
    pub height: i32,
    pub bit_depth: u16,
}

/// A validated bitmap borrowing its pixel rows from the frame.
///
/// Rows are stored bottom-up: row 0 of [`Self::pixels`] is the visually
/// lowest row of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedBitmap<'a> {
    header: BitmapHeader,
    width: u32,
    height: u32,
    row_stride: usize,
    pixels: &'a [u8],
}

impl<'a> DecodedBitmap<'a> {
    pub fn header(&self) -> &BitmapHeader {
        &self.header
    }

    /// Width in pixels (magnitude of the header value).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels (magnitude of the header value).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per source row, DWORD aligned.
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Exactly `row_stride * height` bytes of packed rows.
    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// Source row `index` in storage (bottom-up) order.
    pub fn row(&self, index: usize) -> Option<&'a [u8]> {
        let start = index.checked_mul(self.row_stride)?;
        self.pixels.get(start..start.checked_add(self.row_stride)?)
    }
}

/// Bytes per source row: `((width + 31) / 32) * 4`.
pub fn row_stride_in(width: u32) -> usize {
    (width as usize).div_ceil(32) * 4
}

/// Decodes `frame` as a 1-bit bitmap.
///
/// # Errors
///
/// Returns, in check order, [`DecodeError::TooSmall`],
/// [`DecodeError::BadSignature`], [`DecodeError::UnsupportedDepth`] or
/// [`DecodeError::Truncated`].
///
/// # Examples
///
/// ```
/// use trmnl_core::bitmap::{decode, encoder::encode_monochrome};
///
/// let frame = encode_monochrome(8, 1, &[vec![0xAA]]).unwrap();
/// let bitmap = decode(&frame).unwrap();
/// assert_eq!((bitmap.width(), bitmap.height()), (8, 1));
/// assert_eq!(bitmap.row(0).unwrap()[0], 0xAA);
/// ```
pub fn decode(frame: &[u8]) -> Result<DecodedBitmap<'_>, DecodeError> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(DecodeError::TooSmall { length: frame.len() });
    }

    let signature = [frame[offset::SIGNATURE], frame[offset::SIGNATURE + 1]];
    if signature != SIGNATURE {
        return Err(DecodeError::BadSignature(signature));
    }

    let bit_depth = read_u16_le(frame, offset::BIT_DEPTH)?;
    if bit_depth != SUPPORTED_BIT_DEPTH {
        return Err(DecodeError::UnsupportedDepth(bit_depth));
    }

    let raw_width = read_i32_le(frame, offset::WIDTH)?;
    let raw_height = read_i32_le(frame, offset::HEIGHT)?;
    let width = raw_width.unsigned_abs();
    let height = raw_height.unsigned_abs();
    let row_stride = row_stride_in(width);

    let pixel_data_offset = read_u32_le(frame, offset::PIXEL_DATA_OFFSET)?;

    // 64-bit so hostile dimensions cannot wrap.
    let pixel_len = row_stride as u64 * u64::from(height);
    let required = u64::from(pixel_data_offset) + pixel_len;
    if required > frame.len() as u64 {
        return Err(DecodeError::Truncated {
            required,
            available: frame.len(),
        });
    }

    let start = pixel_data_offset as usize;
    let pixels = &frame[start..start + pixel_len as usize];

    Ok(DecodedBitmap {
        header: BitmapHeader {
            signature,
            declared_size: read_u32_le(frame, offset::DECLARED_SIZE)?,
            pixel_data_offset,
            width: raw_width,
            height: raw_height,
            bit_depth,
        },
        width,
        height,
        row_stride,
        pixels,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
