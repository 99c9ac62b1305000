//! Shared test infrastructure
//!
//! Secret store doubles and authorizer construction helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokengate::authz::TokenAuthorizer;
use tokengate::cache::{CircuitBreaker, TokenCache, TokenCacheConfig};
use tokengate::secrets::{SecretStore, SecretStoreError};

/// Parameter name used throughout the tests
pub const SECRET_NAME: &str = "/wrist-agent/client-token";

/// Resource identifier echoed in policies
pub const METHOD_ARN: &str = "arn:aws:execute-api:us-west-2:123456789012:api-id/stage/POST/invoke";

/// Store double whose answers can be switched between calls
pub struct ControlledStore {
    responses: Mutex<VecDeque<Result<String, SecretStoreError>>>,
    fallback: Mutex<Result<String, SecretStoreError>>,
    calls: AtomicUsize,
}

impl ControlledStore {
    /// Every call returns `value` until told otherwise
    pub fn healthy(value: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(value.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails until told otherwise
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Err(SecretStoreError::Backend("service unavailable".into()))),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer every subsequent call with `value`
    pub fn set_value(&self, value: &str) {
        *self.fallback.lock().unwrap() = Ok(value.to_string());
    }

    /// Fail every subsequent call
    pub fn set_failing(&self) {
        *self.fallback.lock().unwrap() =
            Err(SecretStoreError::Backend("service unavailable".into()));
    }

    /// Queue one-off answers ahead of the fallback
    pub fn push(&self, response: Result<String, SecretStoreError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for ControlledStore {
    async fn get_secret(&self, _name: &str, _decrypt: bool) -> Result<String, SecretStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return response;
        }
        self.fallback.lock().unwrap().clone()
    }
}

/// Cache settings used by the tests: 5 minute TTL, 3s fetch timeout
pub fn cache_config() -> TokenCacheConfig {
    TokenCacheConfig::new(SECRET_NAME)
}

/// Authorizer over `store` with a 3 failure / 30s breaker
pub fn build_authorizer(store: Arc<dyn SecretStore>) -> (TokenAuthorizer, Arc<TokenCache>) {
    let breaker = Arc::new(CircuitBreaker::new(3, Duration::from_secs(30)));
    let cache = Arc::new(TokenCache::new(cache_config(), store, breaker));
    (TokenAuthorizer::new(Arc::clone(&cache)), cache)
}
