//! Environment-style configuration
//!
//! | variable | default |
//! |---|---|
//! | `CLIENT_TOKEN_PARAM_NAME` | `/wrist-agent/client-token` |
//! | `AWS_REGION` | `us-west-2` |
//! | `SSM_ENDPOINT_URL` | unset |
//! | `SECRET_FETCH_TIMEOUT_SECONDS` | `3` |
//! | `TOKEN_CACHE_TTL_SECONDS` | `300` |
//! | `TOKEN_CACHE_STALE_ON_FAILURE` | `true` |
//! | `CIRCUIT_BREAKER_THRESHOLD` | `3` |
//! | `CIRCUIT_BREAKER_COOLDOWN_SECONDS` | `30` |
//! | `AUTHORIZER_ADDRESS` | `0.0.0.0:8080` |
//! | `METRICS_ENABLED` | `true` |
//! | `METRICS_PORT` | `9090` |

use super::{
    BreakerConfig, CacheConfig, Config, MetricsConfig, SecretStoreConfig, ServerConfig,
};
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

pub(super) fn from_env() -> Config {
    let store_defaults = SecretStoreConfig::default();
    let cache_defaults = CacheConfig::default();
    let breaker_defaults = BreakerConfig::default();
    let metrics_defaults = MetricsConfig::default();

    Config {
        server: ServerConfig {
            address: env_string("AUTHORIZER_ADDRESS")
                .unwrap_or_else(|| ServerConfig::default().address),
        },
        secret_store: SecretStoreConfig {
            parameter_name: env_string("CLIENT_TOKEN_PARAM_NAME")
                .map(|name| name.trim().to_string())
                .unwrap_or(store_defaults.parameter_name),
            region: env_string("AWS_REGION").unwrap_or(store_defaults.region),
            endpoint: env_string("SSM_ENDPOINT_URL"),
            access_key: None,
            secret_key: None,
            fetch_timeout_seconds: env_positive(
                "SECRET_FETCH_TIMEOUT_SECONDS",
                store_defaults.fetch_timeout_seconds,
            ),
        },
        cache: CacheConfig {
            ttl_seconds: env_positive("TOKEN_CACHE_TTL_SECONDS", cache_defaults.ttl_seconds),
            stale_on_failure: env_bool(
                "TOKEN_CACHE_STALE_ON_FAILURE",
                cache_defaults.stale_on_failure,
            ),
        },
        breaker: BreakerConfig {
            failure_threshold: env_positive(
                "CIRCUIT_BREAKER_THRESHOLD",
                breaker_defaults.failure_threshold,
            ),
            cool_down_seconds: env_positive(
                "CIRCUIT_BREAKER_COOLDOWN_SECONDS",
                breaker_defaults.cool_down_seconds,
            ),
        },
        metrics: MetricsConfig {
            enabled: env_bool("METRICS_ENABLED", metrics_defaults.enabled),
            port: env_positive("METRICS_PORT", metrics_defaults.port),
        },
    }
}

/// Non-empty value of `key`
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Positive number from `key`, or `default` with a warning when invalid
fn env_positive<T>(key: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Display + Copy,
{
    let Some(raw) = env_string(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    let Some(raw) = env_string(key) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => {
            warn!(key, value = %raw, default, "Invalid boolean, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "CLIENT_TOKEN_PARAM_NAME",
        "AWS_REGION",
        "SSM_ENDPOINT_URL",
        "SECRET_FETCH_TIMEOUT_SECONDS",
        "TOKEN_CACHE_TTL_SECONDS",
        "TOKEN_CACHE_STALE_ON_FAILURE",
        "CIRCUIT_BREAKER_THRESHOLD",
        "CIRCUIT_BREAKER_COOLDOWN_SECONDS",
        "AUTHORIZER_ADDRESS",
        "METRICS_ENABLED",
        "METRICS_PORT",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = from_env();
        assert_eq!(config.secret_store.parameter_name, "/wrist-agent/client-token");
        assert_eq!(config.secret_store.region, "us-west-2");
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker.cool_down_seconds, 30);
        assert_eq!(config.secret_store.fetch_timeout_seconds, 3);
    }

    #[test]
    #[serial]
    fn test_custom_values() {
        clear();
        std::env::set_var("CLIENT_TOKEN_PARAM_NAME", "  /custom/token  ");
        std::env::set_var("TOKEN_CACHE_TTL_SECONDS", "600");
        std::env::set_var("CIRCUIT_BREAKER_THRESHOLD", "5");
        std::env::set_var("TOKEN_CACHE_STALE_ON_FAILURE", "false");

        let config = from_env();
        assert_eq!(config.secret_store.parameter_name, "/custom/token");
        assert_eq!(config.cache.ttl_seconds, 600);
        assert_eq!(config.breaker.failure_threshold, 5);
        assert!(!config.cache.stale_on_failure);
        clear();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear();
        std::env::set_var("TOKEN_CACHE_TTL_SECONDS", "invalid");
        std::env::set_var("CIRCUIT_BREAKER_THRESHOLD", "0");
        std::env::set_var("CIRCUIT_BREAKER_COOLDOWN_SECONDS", "-5");
        std::env::set_var("METRICS_ENABLED", "maybe");

        let config = from_env();
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker.cool_down_seconds, 30);
        assert!(config.metrics.enabled);
        clear();
    }
}
