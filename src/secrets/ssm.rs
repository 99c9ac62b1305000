//! AWS SSM Parameter Store backed secret store
//!
//! # Example
//!
//! ```no_run
//! use tokengate::config::SecretStoreConfig;
//! use tokengate::secrets::{SecretStore, SsmSecretStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SecretStoreConfig::default();
//! let store = SsmSecretStore::new(&config).await?;
//! let value = store.get_secret(&config.parameter_name, true).await?;
//! # Ok(())
//! # }
//! ```

use super::{SecretStore, SecretStoreError};
use crate::config::SecretStoreConfig;
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_ssm::error::DisplayErrorContext;

/// Provider name reported for credentials taken from configuration
const STATIC_PROVIDER_NAME: &str = "tokengate-config";

/// SSM client wrapper
pub struct SsmSecretStore {
    client: aws_sdk_ssm::Client,
}

impl SsmSecretStore {
    /// Build an SSM client from configuration
    ///
    /// Uses the default AWS credential chain unless both `access_key` and
    /// `secret_key` are configured. SDK retries are disabled: a fetch is a
    /// single attempt and repeated failures are the circuit breaker's job.
    pub async fn new(config: &SecretStoreConfig) -> Result<Self, SecretStoreError> {
        if config.region.trim().is_empty() {
            return Err(SecretStoreError::Config("region is required".into()));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::disabled());

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key.clone(),
                    secret_key.clone(),
                    None,
                    None,
                    STATIC_PROVIDER_NAME,
                ));
            }
            (None, None) => {}
            _ => {
                return Err(SecretStoreError::Config(
                    "access_key and secret_key must be set together".into(),
                ))
            }
        }

        let sdk_config = loader.load().await;
        Ok(Self {
            client: aws_sdk_ssm::Client::new(&sdk_config),
        })
    }
}

#[async_trait]
impl SecretStore for SsmSecretStore {
    async fn get_secret(&self, name: &str, decrypt: bool) -> Result<String, SecretStoreError> {
        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(decrypt)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.as_service_error();
                if service_error.is_some_and(|se| se.is_parameter_not_found()) {
                    SecretStoreError::NotFound(name.to_string())
                } else {
                    SecretStoreError::Backend(DisplayErrorContext(&e).to_string())
                }
            })?;

        output
            .parameter()
            .and_then(|p| p.value())
            .map(str::to_string)
            .ok_or_else(|| SecretStoreError::Empty(name.to_string()))
    }
}
