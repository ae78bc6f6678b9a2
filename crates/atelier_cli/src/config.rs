//! Configuration file support for atelier.
//!
//! Settings resolve from the first source that has them:
//! 1. CLI flags
//! 2. Environment variables (prefixed with `ATELIER_`, sections separated by
//!    a double underscore, e.g., `ATELIER_UPSTREAM__API_KEY`)
//! 3. Config file (./atelier.toml, then ~/.config/atelier/config.toml)
//! 4. Built-in defaults
//!
//! Without `[database] url` the mirror lives at
//! `~/.local/state/atelier/atelier.db` on Linux.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/atelier/atelier.db"  # optional, this is the default
//!
//! [upstream]
//! base_url = "https://api.gallery.example/v1"
//! api_key = "..."  # or use ATELIER_UPSTREAM__API_KEY
//! timeout_secs = 30
//! requests_per_second = 5  # 0 disables client-side pacing
//!
//! [sync]
//! page_size = 100
//! detail_concurrency = 2
//! detail_delay_ms = 1000
//! max_detail_attempts = 6
//! backoff_base_ms = 5000
//! heartbeat_secs = 10
//! run_deadline_secs = 300
//! schedule_every_minutes = 120
//! schedule_deadline_secs = 1800
//! lease_minutes = 30
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL. Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// Gallery API connection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API root, e.g. `https://api.gallery.example/v1`.
    pub base_url: Option<String>,
    /// Bearer key.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Client-side pacing; 0 disables it.
    pub requests_per_second: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: 30,
            requests_per_second: atelier::upstream::DEFAULT_RPS,
        }
    }
}

/// Sync tuning and trigger cadence.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub page_size: u64,
    pub detail_concurrency: usize,
    pub detail_delay_ms: u64,
    pub max_detail_attempts: usize,
    pub backoff_base_ms: u64,
    pub heartbeat_secs: u64,
    /// Deadline for a one-shot `run`.
    pub run_deadline_secs: u64,
    pub schedule_every_minutes: u64,
    /// Deadline for each scheduled run.
    pub schedule_deadline_secs: u64,
    pub lease_minutes: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            detail_concurrency: 2,
            detail_delay_ms: 1000,
            max_detail_attempts: 6,
            backoff_base_ms: 5000,
            heartbeat_secs: 10,
            run_deadline_secs: 300,
            schedule_every_minutes: 120,
            schedule_deadline_secs: 1800,
            lease_minutes: 30,
        }
    }
}

impl SyncConfig {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    pub fn schedule_every(&self) -> Duration {
        Duration::from_secs(self.schedule_every_minutes.max(1) * 60)
    }
}

impl Config {
    /// Merge defaults, `~/.config/atelier/config.toml`, `./atelier.toml`
    /// and `ATELIER_*` variables, each layer overriding the previous one.
    ///
    /// A broken source is logged and the defaults are used instead.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "atelier") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("atelier.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./atelier.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // ATELIER_SYNC__PAGE_SIZE -> sync.page_size
        builder = builder.add_source(
            Environment::with_prefix("ATELIER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Configured URL, or a SQLite file under the state directory
    /// (`mode=rwc` creates it on first use).
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("atelier.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// On Linux, this is `$XDG_STATE_HOME/atelier` or `~/.local/state/atelier`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "atelier").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
