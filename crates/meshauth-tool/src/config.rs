// ============================================
// File: crates/meshauth-tool/src/config.rs
// ============================================
//! # Tool Configuration
//!
//! ## Creation Reason
//! PEX sync parameters and the log level can be tuned from a TOML file
//! passed with `--config`. Without one, the defaults below apply.
//!
//! ## Configuration Sections
//! - `sync`: default PEX port, reply deadline, receive buffer size
//! - `logging`: log level
//!
//! ## Example Configuration
//! ```toml
//! [sync]
//! default_port = 51819
//! timeout_ms = 5000
//! max_datagram = 1024
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use meshauth_core::protocol::PEX_MAX_DATAGRAM;

use crate::error::{Result, ToolError};

/// Largest UDP payload over IPv4.
const MAX_UDP_PAYLOAD: usize = 65507;

// ============================================
// ToolConfig
// ============================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// PEX sync settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ToolConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// `ConfigLoad` if the file cannot be read or parsed, `ConfigInvalid`
    /// if a value is out of range.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ToolError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ToolError::config_load(&path_str, e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a string.
    ///
    /// # Errors
    /// Same as [`ToolConfig::load`].
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ToolError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// `ConfigInvalid` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        self.sync.validate()
    }

    /// Serializes configuration to a TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

// ============================================
// SyncConfig
// ============================================

/// PEX sync section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Port used when an endpoint has none.
    #[serde(default = "default_port")]
    pub default_port: u16,

    /// Reply deadline in milliseconds, counted from the request.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Receive buffer size in bytes.
    #[serde(default = "default_max_datagram")]
    pub max_datagram: usize,
}

fn default_port() -> u16 {
    51819
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_datagram() -> usize {
    PEX_MAX_DATAGRAM
}

impl SyncConfig {
    fn validate(&self) -> Result<()> {
        if self.default_port == 0 {
            return Err(ToolError::config_invalid(
                "sync.default_port",
                "port cannot be 0",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ToolError::config_invalid(
                "sync.timeout_ms",
                "timeout cannot be 0",
            ));
        }
        if !(PEX_MAX_DATAGRAM..=MAX_UDP_PAYLOAD).contains(&self.max_datagram) {
            return Err(ToolError::config_invalid(
                "sync.max_datagram",
                format!("must be between {PEX_MAX_DATAGRAM} and {MAX_UDP_PAYLOAD}"),
            ));
        }
        Ok(())
    }

    /// Reply deadline as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_port: default_port(),
            timeout_ms: default_timeout_ms(),
            max_datagram: default_max_datagram(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error, off).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ToolConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.default_port, 51819);
        assert_eq!(config.sync.timeout(), Duration::from_secs(5));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config() {
        let config = ToolConfig::from_str(
            r#"
            [sync]
            timeout_ms = 250
        "#,
        )
        .unwrap();
        assert_eq!(config.sync.timeout_ms, 250);
        assert_eq!(config.sync.default_port, 51819);
        assert_eq!(config.sync.max_datagram, 1024);
    }

    #[test]
    fn test_invalid_values() {
        for toml in [
            "[sync]\ndefault_port = 0",
            "[sync]\ntimeout_ms = 0",
            "[sync]\nmax_datagram = 512",
            "[sync]\nmax_datagram = 70000",
        ] {
            let err = ToolConfig::from_str(toml).unwrap_err();
            assert!(err.is_config_error(), "{toml}");
        }
    }

    #[test]
    fn test_roundtrip() {
        let config = ToolConfig::default();
        let parsed = ToolConfig::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.sync.timeout_ms, config.sync.timeout_ms);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = ToolConfig::load("/nonexistent/meshauth.toml").await.unwrap_err();
        assert!(matches!(err, ToolError::ConfigLoad { .. }));
    }
}
