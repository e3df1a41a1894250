//! Relay configuration
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, and command-line flags. Every field in the file is
//! optional and falls back to its default.
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 5000
//! broadcast_interval_ms = 200
//! rate_limit = "global"
//! dispatch_pacing_ms = 50
//! read_buffer_size = 1024
//! max_line_length = 4096
//! ```

use crate::error::RelayError;
use crate::rate_limiter::RateLimitScope;
use serde::Deserialize;
use shared::{DEFAULT_MAX_LINE_LENGTH, DEFAULT_PORT};
use std::path::Path;
use std::time::Duration;

/// Minimum spacing between rate-limited broadcasts
pub const DEFAULT_BROADCAST_INTERVAL_MS: u64 = 200;

/// Delay between dispatches while the inbound queue still holds messages
pub const DEFAULT_DISPATCH_PACING_MS: u64 = 50;

/// Size of the per-connection read buffer
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to bind the listener to
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    /// Minimum time between two rate-limited broadcasts sharing a limiter key
    pub broadcast_interval_ms: u64,
    /// Granularity of the broadcast rate limiter
    pub rate_limit: RateLimitScope,
    /// Pause between consecutive dispatches while messages are queued
    pub dispatch_pacing_ms: u64,
    /// Bytes requested per transport read
    pub read_buffer_size: usize,
    /// Longest line a session may send before it is disconnected
    pub max_line_length: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            broadcast_interval_ms: DEFAULT_BROADCAST_INTERVAL_MS,
            rate_limit: RateLimitScope::Global,
            dispatch_pacing_ms: DEFAULT_DISPATCH_PACING_MS,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl RelayConfig {
    /// Loads and validates a configuration file
    pub async fn load(path: &Path) -> Result<Self, RelayError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| RelayError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                })?;

        let config: RelayConfig =
            toml::from_str(&content).map_err(|source| RelayError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot run with
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.read_buffer_size == 0 {
            return Err(RelayError::InvalidConfig(
                "read_buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.max_line_length == 0 {
            return Err(RelayError::InvalidConfig(
                "max_line_length must be greater than zero".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(RelayError::InvalidConfig("host must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }

    pub fn dispatch_pacing(&self) -> Duration {
        Duration::from_millis(self.dispatch_pacing_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.broadcast_interval(), Duration::from_millis(200));
        assert_eq!(config.dispatch_pacing(), Duration::from_millis(50));
        assert_eq!(config.rate_limit, RateLimitScope::Global);
        assert_eq!(config.read_buffer_size, 1024);
        assert_eq!(config.max_line_length, 4096);
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
port = 6000
rate_limit = "per-session-kind"
"#,
        )
        .unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.rate_limit, RateLimitScope::PerSessionKind);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.broadcast_interval_ms, 200);
    }

    #[test]
    fn test_unknown_rate_limit_rejected() {
        let result: Result<RelayConfig, _> = toml::from_str(r#"rate_limit = "per-planet""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_read_buffer_rejected() {
        let config = RelayConfig {
            read_buffer_size: 0,
            ..RelayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RelayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_max_line_length_rejected() {
        let config = RelayConfig {
            max_line_length: 0,
            ..RelayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RelayError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("relay-config-{}.toml", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "host = \"127.0.0.1\"").unwrap();
            writeln!(file, "broadcast_interval_ms = 75").unwrap();
        }

        let config = RelayConfig::load(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.broadcast_interval(), Duration::from_millis(75));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let path = Path::new("/nonexistent/relay.toml");
        let result = RelayConfig::load(path).await;
        assert!(matches!(result, Err(RelayError::ConfigRead { .. })));
    }
}
