//! Configuration for shapehub
//!
//! Read from `config.toml` in the shapehub config directory when present:
//!
//! ```toml
//! base_url = "https://shapes.example.com"
//! page_size = 20
//! scroll_threshold = 100
//! search_debounce_ms = 350
//! locale = "de"
//! timeout_secs = 30
//! host_bridge_path = "/run/user/1000/shapehub-host"
//! ```
//!
//! Missing keys take their defaults. `SHAPEHUB_BASE_URL` and `SHAPEHUB_LOCALE`
//! override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::locale::Locale;

pub const BASE_URL_ENV: &str = "SHAPEHUB_BASE_URL";
pub const LOCALE_ENV: &str = "SHAPEHUB_LOCALE";

/// Browse session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    /// Root of the catalog service
    pub base_url: String,
    /// Cards materialized per batch
    pub page_size: usize,
    /// Distance to the bottom of the list, in pixels, that triggers a batch
    pub scroll_threshold: f64,
    /// Quiet period before search input is applied
    pub search_debounce_ms: u64,
    pub locale: Locale,
    pub user_agent: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Host bridge endpoint; falls back to `SHAPEHUB_HOST_BRIDGE` when unset
    pub host_bridge_path: Option<PathBuf>,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            page_size: 20,
            scroll_threshold: 100.0,
            search_debounce_ms: 350,
            locale: Locale::En,
            user_agent: format!("shapehub/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            host_bridge_path: None,
        }
    }
}

impl BrowseConfig {
    /// Default location: `<config dir>/shapehub/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shapehub").join("config.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BrowseConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the default location, then apply environment overrides.
    ///
    /// A missing file is not an error.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path)?,
            _ => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(tag) = lookup(LOCALE_ENV) {
            self.locale = Locale::parse(&tag).ok_or_else(|| ConfigError::InvalidValue {
                field: LOCALE_ENV.to_string(),
                value: tag.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size".to_string(),
                value: "0".to_string(),
            });
        }
        if !self.scroll_threshold.is_finite() || self.scroll_threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "scroll_threshold".to_string(),
                value: self.scroll_threshold.to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
