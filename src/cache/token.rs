//! Canonical secret cache
//!
//! Holds the last fetched secret with its expiry. Reads take the read lock
//! and copy the `(value, expires_at)` pair in one critical section. A miss
//! goes through `refresh_at`, which serializes fetches on a refresh gate
//! and re-checks freshness and the breaker once it holds the gate, so
//! concurrent misses produce a single store call. The data lock is never held across the
//! fetch itself.
//!
//! When the store fails or the breaker is open, the last known value is
//! served even if expired (`stale_on_failure`). With no value cached at
//! all, the failure propagates.

use super::breaker::CircuitBreaker;
use crate::metrics;
use crate::secrets::{SecretStore, SecretStoreError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Default freshness window (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default bound on a single store fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// Cache errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Circuit breaker open and no cached secret available")]
    CircuitOpen,

    #[error(transparent)]
    Fetch(#[from] SecretStoreError),
}

/// Token cache settings
#[derive(Debug, Clone)]
pub struct TokenCacheConfig {
    /// Name of the secret in the store
    pub secret_name: String,
    /// Freshness window of a fetched value
    pub ttl: Duration,
    /// Upper bound on one store fetch
    pub fetch_timeout: Duration,
    /// Serve an expired value when the store is failing
    pub stale_on_failure: bool,
}

impl TokenCacheConfig {
    pub fn new(secret_name: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            ttl: DEFAULT_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            stale_on_failure: true,
        }
    }
}

#[derive(Debug, Default)]
struct CachedSecret {
    value: String,
    expires_at: Option<Instant>,
}

impl CachedSecret {
    fn fresh_at(&self, now: Instant) -> bool {
        !self.value.is_empty() && self.expires_at.is_some_and(|exp| now < exp)
    }
}

/// Secret cache in front of a `SecretStore`
pub struct TokenCache {
    config: TokenCacheConfig,
    store: Arc<dyn SecretStore>,
    breaker: Arc<CircuitBreaker>,
    entry: RwLock<CachedSecret>,
    refresh_gate: Mutex<()>,
}

impl TokenCache {
    /// Create an empty cache
    pub fn new(
        config: TokenCacheConfig,
        store: Arc<dyn SecretStore>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            config,
            store,
            breaker,
            entry: RwLock::new(CachedSecret::default()),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Get the canonical secret, fetching it if needed
    pub async fn get(&self) -> Result<String, CacheError> {
        self.get_at(Instant::now(), None).await
    }

    /// Get the canonical secret as of `now`
    ///
    /// `deadline` is the caller's own processing deadline; a fetch never
    /// runs past it.
    pub async fn get_at(
        &self,
        now: Instant,
        deadline: Option<Instant>,
    ) -> Result<String, CacheError> {
        if let Some(value) = self.fresh_value(now).await {
            return Ok(value);
        }
        self.refresh_at(now, deadline).await
    }

    /// Refresh from the store unless another caller already did
    ///
    /// The whole call, including the wait for an in-flight refresh, is
    /// bounded by `min(fetch_timeout, deadline - now)`. A caller whose
    /// budget runs out while queued is answered from the stale value, or
    /// with a timeout when there is none. Elapsed wall-clock time is added
    /// to `now`, so failures and expiries are stamped when the fetch ends.
    pub async fn refresh_at(
        &self,
        now: Instant,
        deadline: Option<Instant>,
    ) -> Result<String, CacheError> {
        if self.breaker.is_open_at(now) {
            debug!("Circuit breaker open, skipping secret fetch");
            return self.fall_back(CacheError::CircuitOpen).await;
        }

        let entered = Instant::now();
        let budget = self.fetch_budget(now, deadline);
        if budget.is_zero() {
            return self
                .complete(now, Err(SecretStoreError::Timeout(budget)), 0.0)
                .await;
        }

        let _gate = match tokio::time::timeout(budget, self.refresh_gate.lock()).await {
            Ok(gate) => gate,
            Err(_) => {
                if let Some(value) = self.fresh_value(now + entered.elapsed()).await {
                    return Ok(value);
                }
                debug!(
                    secret_name = %self.config.secret_name,
                    "Budget spent waiting for an in-flight refresh"
                );
                return self
                    .fall_back(CacheError::Fetch(SecretStoreError::Timeout(budget)))
                    .await;
            }
        };

        let now = now + entered.elapsed();
        if let Some(value) = self.fresh_value(now).await {
            return Ok(value);
        }
        if self.breaker.is_open_at(now) {
            debug!("Circuit breaker opened while waiting, skipping secret fetch");
            return self.fall_back(CacheError::CircuitOpen).await;
        }

        let remaining = budget.saturating_sub(entered.elapsed());
        let started = Instant::now();
        let fetched = self.fetch(remaining).await;
        let elapsed = started.elapsed();

        self.complete(now + elapsed, fetched, elapsed.as_secs_f64())
            .await
    }

    /// `min(fetch_timeout, deadline - now)`
    fn fetch_budget(&self, now: Instant, deadline: Option<Instant>) -> Duration {
        match deadline {
            Some(deadline) => self
                .config
                .fetch_timeout
                .min(deadline.saturating_duration_since(now)),
            None => self.config.fetch_timeout,
        }
    }

    /// Record the outcome of a fetch that ended at `done`
    async fn complete(
        &self,
        done: Instant,
        fetched: Result<String, SecretStoreError>,
        elapsed_secs: f64,
    ) -> Result<String, CacheError> {
        match fetched {
            Ok(value) => {
                self.breaker.reset();
                {
                    let mut entry = self.entry.write().await;
                    entry.value = value.clone();
                    entry.expires_at = Some(done + self.config.ttl);
                }
                metrics::record_secret_fetch("success", elapsed_secs);
                info!(
                    secret_name = %self.config.secret_name,
                    ttl_secs = self.config.ttl.as_secs(),
                    "Secret refreshed from store"
                );
                Ok(value)
            }
            Err(e) => {
                self.breaker.record_failure_at(done);
                metrics::record_secret_fetch(e.status_label(), elapsed_secs);
                warn!(
                    secret_name = %self.config.secret_name,
                    failures = self.breaker.failure_count(),
                    error = %e,
                    "Secret fetch failed"
                );
                self.fall_back(CacheError::Fetch(e)).await
            }
        }
    }

    /// One store call bounded by `timeout`; the value is trimmed and must be
    /// non-empty
    async fn fetch(&self, timeout: Duration) -> Result<String, SecretStoreError> {
        if timeout.is_zero() {
            return Err(SecretStoreError::Timeout(timeout));
        }

        let raw = tokio::time::timeout(
            timeout,
            self.store.get_secret(&self.config.secret_name, true),
        )
        .await
        .map_err(|_| SecretStoreError::Timeout(timeout))??;

        let value = raw.trim();
        if value.is_empty() {
            return Err(SecretStoreError::Empty(self.config.secret_name.clone()));
        }
        Ok(value.to_string())
    }

    async fn fresh_value(&self, now: Instant) -> Option<String> {
        let entry = self.entry.read().await;
        entry.fresh_at(now).then(|| entry.value.clone())
    }

    async fn fall_back(&self, err: CacheError) -> Result<String, CacheError> {
        if self.config.stale_on_failure {
            let entry = self.entry.read().await;
            if !entry.value.is_empty() {
                warn!(
                    secret_name = %self.config.secret_name,
                    "Serving stale cached secret"
                );
                metrics::record_stale_served();
                return Ok(entry.value.clone());
            }
        }
        Err(err)
    }

    /// Copy of the cached `(value, expires_at)` pair
    pub async fn snapshot(&self) -> (String, Option<Instant>) {
        let entry = self.entry.read().await;
        (entry.value.clone(), entry.expires_at)
    }

    /// Whether the cached value is fresh at `now`
    pub async fn is_fresh_at(&self, now: Instant) -> bool {
        self.entry.read().await.fresh_at(now)
    }

    /// Seed the cache as if `value` had been fetched at `now`
    pub async fn set_at(&self, value: impl Into<String>, now: Instant) {
        let mut entry = self.entry.write().await;
        entry.value = value.into();
        entry.expires_at = Some(now + self.config.ttl);
    }
}
