//! Client configuration
//!
//! Loaded from `config.toml` in the platform config directory, or an
//! explicit path. Every field has a default so a missing file is fine.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Page size for the first fetch of a chat
pub const DEFAULT_INITIAL_PAGE_SIZE: u32 = 50;

/// Page size for each backward pagination fetch
pub const DEFAULT_OLDER_PAGE_SIZE: u32 = 30;

/// Consecutive empty `has_more` pages tolerated before pagination stops
pub const DEFAULT_MAX_EMPTY_PAGES: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub timeline: TimelineConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// `host:port` of the chat gateway
    pub addr: String,
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:7440".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub initial_page_size: u32,
    pub older_page_size: u32,
    pub max_empty_pages: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            initial_page_size: DEFAULT_INITIAL_PAGE_SIZE,
            older_page_size: DEFAULT_OLDER_PAGE_SIZE,
            max_empty_pages: DEFAULT_MAX_EMPTY_PAGES,
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_page_size == 0 || self.older_page_size == 0 {
            return Err(Error::Config("page sizes must be at least 1".into()));
        }
        if self.max_empty_pages == 0 {
            return Err(Error::Config("max_empty_pages must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.timeline.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the default location when `path` is None.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&text)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "vibechat", "vibechat").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
