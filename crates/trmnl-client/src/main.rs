//! TRMNL Client Application entry point.
//!
//! Loads the configuration, fetches and presents the first image, then
//! keeps refreshing it on a timer until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()                     -- config.toml or defaults
//!  └─ RefreshImageUseCase::refresh()    -- first image; failure exits non-zero
//!  └─ refresh loop (if auto_refresh)
//!       ├─ interval tick  -> refresh() on a new connection
//!       │                    (failure keeps the previous image)
//!       └─ Ctrl-C         -> exit
//! ```
//!
//! Refreshes run on tokio's blocking thread pool (see
//! `infrastructure::scheduler`).  Ctrl-C is honoured between refreshes and
//! while one is in flight.
//!
//! # Usage
//!
//! ```text
//! trmnl-client [CONFIG_PATH]
//! ```
//!
//! Without `CONFIG_PATH` the platform config file is used.  `RUST_LOG`
//! overrides the configured `log_level`.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trmnl_client::application::{
    display_image::DisplayImageUseCase, fetch_image::FetchImageUseCase,
    refresh_image::RefreshImageUseCase,
};
use trmnl_client::infrastructure::{
    network::TcpConnector,
    presenter::SurfacePresenter,
    scheduler::{refresh_blocking, run_refresh_loop, LoopExit},
    storage::config::{load_config, load_config_from},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Configuration ─────────────────────────────────────────────────────────
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => load_config_from(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => load_config().context("failed to load config")?,
    };

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("TRMNL client starting");

    // ── Use cases ─────────────────────────────────────────────────────────────
    let mut presenter = SurfacePresenter::new(config.surface_bounds());
    if let Some(path) = &config.display.output_path {
        presenter = presenter.with_export(path.clone());
    }

    let mut use_case = RefreshImageUseCase::new(
        FetchImageUseCase::new(TcpConnector, config.fetch_settings()),
        DisplayImageUseCase::new(presenter, config.anchor()),
    );

    // ── First image ───────────────────────────────────────────────────────────
    let (returned, result) = refresh_blocking(use_case).await?;
    use_case = returned;
    let origin = result.context("initial image fetch failed")?;
    info!("image displayed at ({}, {})", origin.x, origin.y);

    let Some(period) = config.refresh_interval() else {
        info!("auto refresh disabled; exiting");
        return Ok(());
    };

    // ── Refresh loop ──────────────────────────────────────────────────────────
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    info!("refreshing every {period:?}; press Ctrl-C to stop");

    match run_refresh_loop(use_case, period, shutdown).await? {
        LoopExit::Idle(use_case) => {
            info!(
                "TRMNL client stopped ({} refreshes succeeded, {} failed)",
                use_case.successes(),
                use_case.failures()
            );
            Ok(())
        }
        LoopExit::DuringRefresh => {
            info!("TRMNL client stopped during a refresh");
            // The runtime would otherwise wait out the fetch's socket timeouts.
            std::process::exit(0);
        }
    }
}
