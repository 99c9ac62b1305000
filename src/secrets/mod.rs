//! Secret store module
//!
//! Fetches the canonical secret by name.
//!
//! # Design
//!
//! Uses a trait-based approach so the cache does not care where the secret
//! lives:
//! - `SecretStore` trait defines the interface
//! - `SsmSecretStore` reads an SSM Parameter Store parameter
//! - `StaticSecretStore` holds a fixed value (local development, tests)
//!
//! Stores do not apply their own deadline. The token cache bounds every
//! call with `tokio::time::timeout`, so an elapsed timeout surfaces as
//! `SecretStoreError::Timeout` there.
//!
//! # Example
//!
//! ```
//! use tokengate::secrets::{SecretStore, StaticSecretStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StaticSecretStore::new("canonical");
//! let value = store.get_secret("/app/client-token", true).await?;
//! assert_eq!(value, "canonical");
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod ssm;

#[cfg(test)]
pub(crate) mod testing;

pub use ssm::SsmSecretStore;

/// Secret store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretStoreError {
    #[error("Secret fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Secret {0} has an empty value")]
    Empty(String),

    #[error("Secret store error: {0}")]
    Backend(String),

    #[error("Secret store configuration error: {0}")]
    Config(String),
}

impl SecretStoreError {
    /// Label used for the fetch status metric
    pub fn status_label(&self) -> &'static str {
        match self {
            SecretStoreError::Timeout(_) => "timeout",
            SecretStoreError::Empty(_) => "empty",
            _ => "failure",
        }
    }
}

/// Source of the canonical secret
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the secret value stored under `name`
    async fn get_secret(&self, name: &str, decrypt: bool) -> Result<String, SecretStoreError>;
}

/// Secret store returning a fixed value regardless of name
#[derive(Debug, Clone)]
pub struct StaticSecretStore {
    value: String,
}

impl StaticSecretStore {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(&self, _name: &str, _decrypt: bool) -> Result<String, SecretStoreError> {
        Ok(self.value.clone())
    }
}
