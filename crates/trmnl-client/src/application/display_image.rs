//! DisplayImageUseCase: places a device bitmap and hands it to the presenter.
//!
//! The use case only decides *where* the image goes, using the configured
//! [`Anchor`].  Clipping and the pixel copy belong to the [`Presenter`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use trmnl_core::{Anchor, Bounds, DeviceBitmap, Origin};

/// Error type for presentation.
#[derive(Debug, Error)]
pub enum PresentError {
    /// The surface could not be exported to disk.
    #[error("could not export surface to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Owner of the display surface.
///
/// `present` takes the bitmap by value; the presenter keeps it for as long
/// as it needs to redraw.
#[cfg_attr(test, mockall::automock)]
pub trait Presenter: Send {
    /// Size of the surface the image is placed on.
    fn surface_bounds(&self) -> Bounds;

    /// Copies `bitmap` onto the surface with its top-left corner at
    /// `origin`, clipping whatever falls outside.
    ///
    /// # Errors
    ///
    /// Returns [`PresentError`] if the presenter could not complete the copy.
    fn present(&mut self, bitmap: DeviceBitmap, origin: Origin) -> Result<(), PresentError>;
}

/// The Display Image use case.
pub struct DisplayImageUseCase<P: Presenter> {
    presenter: P,
    anchor: Anchor,
}

impl<P: Presenter> DisplayImageUseCase<P> {
    pub fn new(presenter: P, anchor: Anchor) -> Self {
        Self { presenter, anchor }
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Presents `bitmap` and returns the origin it was placed at.
    ///
    /// # Errors
    ///
    /// Returns the presenter's [`PresentError`].
    pub fn show(&mut self, bitmap: DeviceBitmap) -> Result<Origin, PresentError> {
        let surface = self.presenter.surface_bounds();
        let origin = self.anchor.origin(surface, bitmap.bounds());
        info!(
            "presenting {}x{} image at ({}, {}) on {}x{} surface",
            bitmap.bounds().width,
            bitmap.bounds().height,
            origin.x,
            origin.y,
            surface.width,
            surface.height
        );
        self.presenter.present(bitmap, origin)?;
        Ok(origin)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
