//! Periodic refresh driven by a tokio interval.
//!
//! Each refresh is blocking socket I/O bounded by timeouts, so it runs on
//! tokio's blocking thread pool.  The use case is moved onto the worker
//! thread and handed back with the result, so only one fetch is ever in
//! flight.
//!
//! The shutdown future is pinned once and polled both between ticks and
//! while a refresh is running; a signal that arrives mid-fetch ends the loop
//! without waiting for the fetch.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};
use trmnl_core::Origin;

use crate::application::display_image::Presenter;
use crate::application::fetch_image::Connector;
use crate::application::refresh_image::{RefreshError, RefreshImageUseCase};

/// Shortest accepted refresh period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// How [`run_refresh_loop`] ended.
pub enum LoopExit<C: Connector, P: Presenter> {
    /// Shutdown arrived between refreshes; the use case is handed back.
    Idle(RefreshImageUseCase<C, P>),
    /// Shutdown arrived while a fetch was running.  The fetch was left to
    /// finish on its worker thread and its result is discarded.
    DuringRefresh,
}

/// Runs one refresh on the blocking thread pool and hands the use case back.
///
/// # Errors
///
/// Fails only if the refresh task panicked.
pub async fn refresh_blocking<C, P>(
    mut use_case: RefreshImageUseCase<C, P>,
) -> anyhow::Result<(RefreshImageUseCase<C, P>, Result<Origin, RefreshError>)>
where
    C: Connector + 'static,
    P: Presenter + 'static,
{
    tokio::task::spawn_blocking(move || {
        let result = use_case.refresh();
        (use_case, result)
    })
    .await
    .context("refresh task panicked")
}

/// Refreshes every `period` until `shutdown` resolves.
///
/// The first refresh happens one full period after the call.  A failed
/// refresh is logged and the loop carries on with the previous image.
///
/// # Errors
///
/// Fails only if a refresh task panicked.
pub async fn run_refresh_loop<C, P, F>(
    mut use_case: RefreshImageUseCase<C, P>,
    period: Duration,
    shutdown: F,
) -> anyhow::Result<LoopExit<C, P>>
where
    C: Connector + 'static,
    P: Presenter + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut ticker = time::interval(period.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // Skip the immediate first tick.

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                return Ok(LoopExit::Idle(use_case));
            }
            _ = ticker.tick() => {}
        }

        let refresh = refresh_blocking(use_case);
        tokio::pin!(refresh);
        let (returned, result) = tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received during a refresh; not waiting for it");
                return Ok(LoopExit::DuringRefresh);
            }
            done = &mut refresh => done?,
        };
        use_case = returned;

        match result {
            Ok(origin) => info!("image refreshed at ({}, {})", origin.x, origin.y),
            Err(e) => warn!("keeping previous image: {e}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::display_image::DisplayImageUseCase;
    use crate::application::fetch_image::{ConnectError, Endpoint, FetchImageUseCase, FetchSettings};
    use crate::infrastructure::network::mock::ScriptedConnector;
    use crate::infrastructure::presenter::SurfacePresenter;
    use trmnl_core::bitmap::encoder::encode_monochrome;
    use trmnl_core::protocol::ScriptedSink;
    use trmnl_core::{Anchor, Bounds};

    /// Connector whose connect attempt blocks for a fixed time, then fails.
    struct StallingConnector {
        stall: Duration,
    }

    impl Connector for StallingConnector {
        type Sink = ScriptedSink;

        fn connect(&self, endpoint: &Endpoint, _timeout: Duration) -> Result<ScriptedSink, ConnectError> {
            std::thread::sleep(self.stall);
            Err(ConnectError::NoAddress {
                host: endpoint.host.clone(),
            })
        }
    }

    fn settings() -> FetchSettings {
        FetchSettings {
            endpoint: Endpoint::new("127.0.0.1", 1337),
            max_frame_size: 65_536,
            connect_timeout: Duration::from_secs(1),
            chunk_timeout: Duration::from_secs(1),
        }
    }

    fn use_case<C: Connector>(connector: C) -> RefreshImageUseCase<C, SurfacePresenter> {
        RefreshImageUseCase::new(
            FetchImageUseCase::new(connector, settings()),
            DisplayImageUseCase::new(SurfacePresenter::new(Bounds::new(8, 1)), Anchor::Centered),
        )
    }

    #[tokio::test]
    async fn test_shutdown_before_first_tick_skips_refresh() {
        // Arrange
        let uc = use_case(ScriptedConnector::new());

        // Act
        let exit = run_refresh_loop(uc, Duration::from_secs(3600), std::future::ready(()))
            .await
            .unwrap();

        // Assert
        let LoopExit::Idle(uc) = exit else {
            panic!("expected an idle exit");
        };
        assert_eq!(uc.fetch_use_case().connector().attempts(), 0);
        assert_eq!(uc.successes() + uc.failures(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_during_refresh_ends_loop_without_waiting() {
        // Arrange – every connect blocks far longer than the shutdown delay
        let uc = use_case(StallingConnector {
            stall: Duration::from_millis(800),
        });
        let shutdown = time::sleep(Duration::from_millis(60));

        // Act
        let exit = time::timeout(
            Duration::from_millis(400),
            run_refresh_loop(uc, Duration::from_millis(10), shutdown),
        )
        .await
        .expect("loop must end before the stalled connect returns")
        .unwrap();

        // Assert
        assert!(matches!(exit, LoopExit::DuringRefresh));
    }

    #[tokio::test]
    async fn test_loop_refreshes_on_ticks_and_survives_failures() {
        // Arrange – one good frame, then every connection is refused
        let frame = encode_monochrome(8, 1, &[vec![0x00]]).unwrap();
        let uc = use_case(ScriptedConnector::new().serve(ScriptedSink::new().bytes(frame)));

        // Act
        let exit = run_refresh_loop(uc, Duration::from_millis(20), time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        // Assert
        let LoopExit::Idle(uc) = exit else {
            panic!("expected an idle exit");
        };
        assert_eq!(uc.successes(), 1);
        assert!(uc.failures() >= 1);
        assert!(uc.display_use_case().presenter().surface().get(0, 0));
    }
}
