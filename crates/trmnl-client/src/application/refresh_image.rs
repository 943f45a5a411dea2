//! RefreshImageUseCase: fetch a fresh image and present it, or keep the old one.
//!
//! Each call opens a new connection, because the server sends exactly one
//! image per connection.  A failed fetch leaves the presenter untouched so
//! the previously shown image stays on the surface.

use thiserror::Error;
use tracing::warn;
use trmnl_core::Origin;

use crate::application::display_image::{DisplayImageUseCase, PresentError, Presenter};
use crate::application::fetch_image::{Connector, FetchError, FetchImageUseCase};

/// Error type for a refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Present(#[from] PresentError),
}

/// The Refresh Image use case.
pub struct RefreshImageUseCase<C: Connector, P: Presenter> {
    fetch: FetchImageUseCase<C>,
    display: DisplayImageUseCase<P>,
    successes: u64,
    failures: u64,
}

impl<C: Connector, P: Presenter> RefreshImageUseCase<C, P> {
    pub fn new(fetch: FetchImageUseCase<C>, display: DisplayImageUseCase<P>) -> Self {
        Self {
            fetch,
            display,
            successes: 0,
            failures: 0,
        }
    }

    pub fn fetch_use_case(&self) -> &FetchImageUseCase<C> {
        &self.fetch
    }

    pub fn display_use_case(&self) -> &DisplayImageUseCase<P> {
        &self.display
    }

    /// Number of refreshes that ended with a new image on the surface.
    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Number of refreshes that failed and kept the previous image.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Fetches one image and presents it.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::Fetch`] when no new image could be obtained
    /// (the surface is left as it was) and [`RefreshError::Present`] when
    /// the presenter rejected it.
    pub fn refresh(&mut self) -> Result<Origin, RefreshError> {
        let result = self
            .fetch
            .fetch()
            .map_err(RefreshError::from)
            .and_then(|bitmap| self.display.show(bitmap).map_err(RefreshError::from));

        match &result {
            Ok(_) => self.successes += 1,
            Err(e) => {
                self.failures += 1;
                warn!("refresh from {} failed: {e}", self.fetch.settings().endpoint);
            }
        }
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
