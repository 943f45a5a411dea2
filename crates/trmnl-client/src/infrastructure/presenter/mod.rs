//! In-memory display surface and the presenter that draws onto it.
//!
//! `MonochromeSurface` uses the device polarity produced by
//! [`trmnl_core::build`]: one bit per pixel, most significant bit leftmost,
//! a set bit is a black pixel.  That is also the polarity of binary Netpbm,
//! so the surface exports to a `P4` file without any conversion.
//!
//! `SurfacePresenter` implements the [`Presenter`] seam: it clears the
//! surface, source-copies the bitmap at the requested origin with clipping,
//! and keeps the bitmap so the surface can be redrawn without re-fetching.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use trmnl_core::{Bounds, DeviceBitmap, Origin};

use crate::application::display_image::{PresentError, Presenter};

// ── Surface ───────────────────────────────────────────────────────────────────

/// A 1-bit framebuffer.  Rows are `ceil(width / 8)` bytes, top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonochromeSurface {
    bounds: Bounds,
    row_stride: usize,
    pixels: Vec<u8>,
}

impl MonochromeSurface {
    /// Creates an all-white surface.
    pub fn new(bounds: Bounds) -> Self {
        let row_stride = (bounds.width as usize).div_ceil(8);
        Self {
            bounds,
            row_stride,
            pixels: vec![0; row_stride * bounds.height as usize],
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether `(x, y)` is black.  Off-surface pixels read as white.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.bounds.width || y >= self.bounds.height {
            return false;
        }
        let byte = self.pixels[y as usize * self.row_stride + x as usize / 8];
        byte & (0x80 >> (x % 8)) != 0
    }

    /// Sets `(x, y)`; off-surface writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, black: bool) {
        if x >= self.bounds.width || y >= self.bounds.height {
            return;
        }
        let mask = 0x80u8 >> (x % 8);
        let byte = &mut self.pixels[y as usize * self.row_stride + x as usize / 8];
        if black {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// Resets every pixel to white.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Copies `bitmap` with its top-left corner at `origin`.  Pixels that
    /// fall outside the surface are dropped; both black and white source
    /// pixels overwrite the destination.
    pub fn blit(&mut self, bitmap: &DeviceBitmap, origin: Origin) {
        let image = bitmap.bounds();
        let (x0, x1) = visible_span(origin.x, image.width, self.bounds.width);
        let (y0, y1) = visible_span(origin.y, image.height, self.bounds.height);

        for sy in y0..y1 {
            let dy = (i64::from(origin.y) + i64::from(sy)) as u32;
            for sx in x0..x1 {
                let dx = (i64::from(origin.x) + i64::from(sx)) as u32;
                self.set(dx, dy, bitmap.bit(sx, sy));
            }
        }
    }

    /// Encodes the surface as a binary Netpbm (`P4`) image.
    pub fn to_pbm(&self) -> Vec<u8> {
        let header = format!("P4\n{} {}\n", self.bounds.width, self.bounds.height);
        let mut out = Vec::with_capacity(header.len() + self.pixels.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.pixels);
        out
    }

    /// Writes [`Self::to_pbm`] to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PresentError::Export`] if the file cannot be written.
    pub fn write_pbm(&self, path: &Path) -> Result<(), PresentError> {
        fs::write(path, self.to_pbm()).map_err(|source| PresentError::Export {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Range of source columns (or rows) `[start, end)` that land on a surface
/// of `surface` pixels when the image starts at `origin`.
fn visible_span(origin: i32, image: u32, surface: u32) -> (u32, u32) {
    let origin = i64::from(origin);
    let start = (-origin).clamp(0, i64::from(image));
    let end = (i64::from(surface) - origin).clamp(start, i64::from(image));
    (start as u32, end as u32)
}

// ── Presenter ─────────────────────────────────────────────────────────────────

/// Presents device bitmaps on a [`MonochromeSurface`].
#[derive(Debug)]
pub struct SurfacePresenter {
    surface: MonochromeSurface,
    last: Option<(DeviceBitmap, Origin)>,
    export_path: Option<PathBuf>,
}

impl SurfacePresenter {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            surface: MonochromeSurface::new(bounds),
            last: None,
            export_path: None,
        }
    }

    /// Also writes the surface to `path` as a `P4` file after every draw.
    pub fn with_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    pub fn surface(&self) -> &MonochromeSurface {
        &self.surface
    }

    /// The bitmap and origin of the most recent `present`.
    pub fn last_presented(&self) -> Option<(&DeviceBitmap, Origin)> {
        self.last.as_ref().map(|(bitmap, origin)| (bitmap, *origin))
    }

    /// Repaints the surface from the retained bitmap.  Does nothing if
    /// nothing has been presented yet.
    ///
    /// # Errors
    ///
    /// Returns [`PresentError::Export`] if the export file cannot be written.
    pub fn redraw(&mut self) -> Result<(), PresentError> {
        let Some((bitmap, origin)) = &self.last else {
            return Ok(());
        };
        self.surface.clear();
        self.surface.blit(bitmap, *origin);
        self.export()
    }

    fn export(&self) -> Result<(), PresentError> {
        if let Some(path) = &self.export_path {
            self.surface.write_pbm(path)?;
            debug!("surface exported to {}", path.display());
        }
        Ok(())
    }
}

impl Presenter for SurfacePresenter {
    fn surface_bounds(&self) -> Bounds {
        self.surface.bounds()
    }

    fn present(&mut self, bitmap: DeviceBitmap, origin: Origin) -> Result<(), PresentError> {
        self.last = Some((bitmap, origin));
        self.redraw()?;
        if let Some(path) = &self.export_path {
            info!("image written to {}", path.display());
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
