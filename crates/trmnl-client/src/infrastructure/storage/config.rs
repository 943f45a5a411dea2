//! TOML-based configuration for the client application.
//!
//! Reads `ClientConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\TRMNL\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/trmnl/config.toml` or `~/.config/trmnl/config.toml`
//! - macOS:    `~/Library/Application Support/TRMNL/config.toml`
//!
//! The file is only ever read.  A missing file yields the defaults, and a
//! file that omits fields gets the default for each omitted field:
//!
//! ```toml
//! log_level = "info"
//!
//! [server]
//! host = "10.0.1.26"
//! port = 1337
//!
//! [fetch]
//! max_frame_size = 65536
//! chunk_timeout_secs = 60
//! connect_timeout_secs = 30
//!
//! [display]
//! surface_width = 512
//! surface_height = 342
//! center_image = true
//! offset_x = 10
//! offset_y = 10
//! # output_path = "/tmp/trmnl.pbm"
//!
//! [refresh]
//! auto_refresh = true
//! interval_minutes = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use trmnl_core::protocol::wire::MIN_FRAME_SIZE;
use trmnl_core::{Anchor, Bounds};

use crate::application::fetch_image::{Endpoint, FetchSettings};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is unusable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Where the image server lives.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Receive limits for one fetch.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FetchConfig {
    /// Frame buffer capacity in bytes.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
    /// Bound on each read, in seconds.
    #[serde(default = "default_chunk_timeout_secs")]
    pub chunk_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Display surface and image placement.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DisplayConfig {
    #[serde(default = "default_surface_width")]
    pub surface_width: u32,
    #[serde(default = "default_surface_height")]
    pub surface_height: u32,
    /// Centre the image; otherwise place it at `(offset_x, offset_y)`.
    #[serde(default = "default_true")]
    pub center_image: bool,
    #[serde(default = "default_offset")]
    pub offset_x: i32,
    #[serde(default = "default_offset")]
    pub offset_y: i32,
    /// When set, the surface is written here as a `P4` file after each draw.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

/// Periodic re-fetching.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RefreshConfig {
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "10.0.1.26".to_string()
}
fn default_port() -> u16 {
    1337
}
fn default_max_frame_size() -> usize {
    65_536
}
fn default_chunk_timeout_secs() -> u64 {
    60
}
fn default_connect_timeout_secs() -> u64 {
    30
}
fn default_surface_width() -> u32 {
    512
}
fn default_surface_height() -> u32 {
    342
}
fn default_true() -> bool {
    true
}
fn default_offset() -> i32 {
    10
}
fn default_interval_minutes() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            fetch: FetchConfig::default(),
            display: DisplayConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_frame_size: default_max_frame_size(),
            chunk_timeout_secs: default_chunk_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            surface_width: default_surface_width(),
            surface_height: default_surface_height(),
            center_image: default_true(),
            offset_x: default_offset(),
            offset_y: default_offset(),
            output_path: None,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            auto_refresh: default_true(),
            interval_minutes: default_interval_minutes(),
        }
    }
}

// ── Derived settings ──────────────────────────────────────────────────────────

impl ClientConfig {
    /// Checks values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return invalid("server.host", "must not be empty");
        }
        if self.server.port == 0 {
            return invalid("server.port", "must not be 0");
        }
        if self.fetch.max_frame_size < MIN_FRAME_SIZE {
            return invalid("fetch.max_frame_size", "must be at least 54 bytes");
        }
        if self.fetch.chunk_timeout_secs == 0 {
            return invalid("fetch.chunk_timeout_secs", "must be greater than 0");
        }
        if self.fetch.connect_timeout_secs == 0 {
            return invalid("fetch.connect_timeout_secs", "must be greater than 0");
        }
        if self.display.surface_width == 0 || self.display.surface_height == 0 {
            return invalid("display", "surface dimensions must be greater than 0");
        }
        if self.refresh.auto_refresh && self.refresh.interval_minutes == 0 {
            return invalid("refresh.interval_minutes", "must be greater than 0 when auto_refresh is on");
        }
        Ok(())
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            endpoint: Endpoint::new(self.server.host.trim(), self.server.port),
            max_frame_size: self.fetch.max_frame_size,
            connect_timeout: Duration::from_secs(self.fetch.connect_timeout_secs),
            chunk_timeout: Duration::from_secs(self.fetch.chunk_timeout_secs),
        }
    }

    pub fn anchor(&self) -> Anchor {
        if self.display.center_image {
            Anchor::Centered
        } else {
            Anchor::TopLeftOffset {
                x: self.display.offset_x,
                y: self.display.offset_y,
            }
        }
    }

    pub fn surface_bounds(&self) -> Bounds {
        Bounds::new(self.display.surface_width, self.display.surface_height)
    }

    /// The refresh period, or `None` when auto refresh is off.
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh
            .auto_refresh
            .then(|| Duration::from_secs(self.refresh.interval_minutes.saturating_mul(60)))
    }
}

fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid { field, reason })
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads and validates the config from the platform config file.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads and validates the config at `path`, returning the defaults if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] if a value is unusable.
pub fn load_config_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<ClientConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ClientConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Resolves the platform config base directory including the `trmnl` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("TRMNL"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("trmnl"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("TRMNL"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
