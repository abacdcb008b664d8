//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Simulated origin latency in milliseconds
    pub origin_delay_ms: u64,
    /// Keys starting with this prefix make the origin fail
    pub origin_fail_prefix: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `ORIGIN_DELAY_MS` - Origin latency in milliseconds (default: 500)
    /// - `ORIGIN_FAIL_PREFIX` - Failing key prefix (default: unset)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            origin_delay_ms: env::var("ORIGIN_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            origin_fail_prefix: env::var("ORIGIN_FAIL_PREFIX")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            origin_delay_ms: 500,
            origin_fail_prefix: None,
        }
    }
}
