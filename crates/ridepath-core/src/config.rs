//! Ridepath configuration
//!
//! Loaded from a TOML file, then overridden by `RIDEPATH_API_URL` and
//! `RIDEPATH_TOKEN`. Every section has defaults, so an empty file is valid.
//!
//! ```toml
//! [api]
//! base_url = "https://api.example.com"
//!
//! [cache]
//! dir = "/var/lib/ridepath"
//! ttl_days = 7
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api.base_url`
pub const ENV_API_URL: &str = "RIDEPATH_API_URL";
/// Environment variable overriding `api.token`
pub const ENV_TOKEN: &str = "RIDEPATH_TOKEN";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RidepathConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub setup: SetupConfig,
    pub chat: ChatConfig,
}

impl RidepathConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the text is not valid for this schema
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - see [`RidepathConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `RIDEPATH_API_URL` / `RIDEPATH_TOKEN` overrides
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_TOKEN).ok(),
        )
    }

    /// Apply explicit overrides; `None` keeps the current value
    #[must_use]
    pub fn with_overrides(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.api.token = Some(token);
        }
        self
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// With cache directory
    #[inline]
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache.dir = dir.into();
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `ConfigError::Invalid` describing the first bad value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if self.cache.ttl_days == 0 {
            return Err(ConfigError::Invalid("cache.ttl_days must be at least 1".into()));
        }
        if self.chat.list_interval_secs == 0 || self.chat.room_interval_secs == 0 {
            return Err(ConfigError::Invalid("chat intervals must be at least 1s".into()));
        }
        Ok(())
    }
}

/// Ride backend connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// No client-side timeout when unset
    pub request_timeout_secs: Option<u64>,
}

impl ApiConfig {
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            token: None,
            request_timeout_secs: None,
        }
    }
}

/// ETA cache persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub ttl_days: u64,
}

impl CacheConfig {
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days.saturating_mul(24 * 60 * 60))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".ridepath"),
            ttl_days: 7,
        }
    }
}

/// Route setup form behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub search_debounce_ms: u64,
    pub search_timeout_secs: u64,
}

impl SetupConfig {
    #[inline]
    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    #[inline]
    #[must_use]
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 300,
            search_timeout_secs: 10,
        }
    }
}

/// Chat polling intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub list_interval_secs: u64,
    pub room_interval_secs: u64,
}

impl ChatConfig {
    #[inline]
    #[must_use]
    pub fn list_interval(&self) -> Duration {
        Duration::from_secs(self.list_interval_secs)
    }

    #[inline]
    #[must_use]
    pub fn room_interval(&self) -> Duration {
        Duration::from_secs(self.room_interval_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            list_interval_secs: 5,
            room_interval_secs: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let config = RidepathConfig::from_toml_str("").unwrap();
        assert_eq!(config, RidepathConfig::default());
        assert_eq!(config.cache.ttl(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.setup.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.chat.list_interval(), Duration::from_secs(5));
        assert_eq!(config.chat.room_interval(), Duration::from_secs(3));
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = RidepathConfig::from_toml_str(
            r#"
            [api]
            base_url = "https://rides.example.com/api"
            request_timeout_secs = 20

            [cache]
            ttl_days = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://rides.example.com/api");
        assert_eq!(config.api.request_timeout(), Some(Duration::from_secs(20)));
        assert_eq!(config.cache.ttl_days, 2);
        assert_eq!(config.cache.dir, PathBuf::from(".ridepath"));
    }

    #[test]
    fn huge_ttl_saturates() {
        let raw = format!("[cache]\nttl_days = {}", i64::MAX);
        let config = RidepathConfig::from_toml_str(&raw).unwrap();
        assert_eq!(config.cache.ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let err = RidepathConfig::from_toml_str("[cache]\nttl_days = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn overrides_skip_blank_values() {
        let config = RidepathConfig::new()
            .with_overrides(Some("https://other".into()), Some("  ".into()));
        assert_eq!(config.api.base_url, "https://other");
        assert_eq!(config.api.token, None);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chat]\nroom_interval_secs = 1").unwrap();

        let config = RidepathConfig::load(file.path()).unwrap();
        assert_eq!(config.chat.room_interval_secs, 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = RidepathConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
