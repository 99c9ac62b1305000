//! Configuration module for Tokengate
//!
//! Configuration comes from a YAML file (with `${VAR}` / `${VAR:-default}`
//! expansion) or, when no file is given, from environment variables. Both
//! paths end in `Config::validate`, and a validation failure aborts
//! startup.

use crate::cache::{CircuitBreaker, TokenCacheConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod env;
mod loader;

pub use loader::ConfigLoader;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub secret_store: SecretStoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Load configuration from environment variables
    ///
    /// See `config::env` for the recognized variables. Unparsable numeric
    /// values fall back to their defaults with a warning.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Invalid server address '{}'",
                self.server.address
            )));
        }

        let store = &self.secret_store;
        if store.parameter_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "secret_store.parameter_name cannot be empty".into(),
            ));
        }
        if store.region.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "secret_store.region cannot be empty".into(),
            ));
        }
        if store.fetch_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "secret_store.fetch_timeout_seconds must be positive".into(),
            ));
        }
        if store.access_key.is_some() != store.secret_key.is_some() {
            return Err(ConfigError::ValidationError(
                "secret_store.access_key and secret_store.secret_key must be set together".into(),
            ));
        }
        if let Some(ref endpoint) = store.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(
                    "Invalid secret_store.endpoint: must start with http:// or https://".into(),
                ));
            }
        }

        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "cache.ttl_seconds must be positive".into(),
            ));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "breaker.failure_threshold must be positive".into(),
            ));
        }
        if self.breaker.cool_down_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "breaker.cool_down_seconds must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Settings for the token cache
    pub fn token_cache_config(&self) -> TokenCacheConfig {
        TokenCacheConfig {
            secret_name: self.secret_store.parameter_name.trim().to_string(),
            ttl: Duration::from_secs(self.cache.ttl_seconds),
            fetch_timeout: Duration::from_secs(self.secret_store.fetch_timeout_seconds),
            stale_on_failure: self.cache.stale_on_failure,
        }
    }

    /// A closed circuit breaker with the configured threshold and cool-down
    pub fn circuit_breaker(&self) -> CircuitBreaker {
        CircuitBreaker::new(
            self.breaker.failure_threshold,
            Duration::from_secs(self.breaker.cool_down_seconds),
        )
    }
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// HTTP front door configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
        }
    }
}

fn default_server_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Secret store (SSM Parameter Store) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretStoreConfig {
    /// Name or path of the parameter holding the canonical secret
    #[serde(default = "default_parameter_name")]
    pub parameter_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override (local stacks, tests)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Per-call bound on a fetch
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
}

impl Default for SecretStoreConfig {
    fn default() -> Self {
        Self {
            parameter_name: default_parameter_name(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            fetch_timeout_seconds: default_fetch_timeout(),
        }
    }
}

fn default_parameter_name() -> String {
    "/wrist-agent/client-token".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_fetch_timeout() -> u64 {
    3
}

/// Token cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Serve an expired secret while the store is failing instead of
    /// denying every request
    #[serde(default = "default_stale_on_failure")]
    pub stale_on_failure: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            stale_on_failure: default_stale_on_failure(),
        }
    }
}

fn default_ttl() -> u64 {
    300 // 5 minutes
}

fn default_stale_on_failure() -> bool {
    true
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_cool_down")]
    pub cool_down_seconds: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cool_down_seconds: default_cool_down(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_cool_down() -> u64 {
    30
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}
