//! Store doubles shared by unit tests

use super::{SecretStore, SecretStoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Replays a fixed sequence of results, then fails
pub struct ScriptedStore {
    script: Mutex<VecDeque<Result<String, SecretStoreError>>>,
    calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(script: Vec<Result<String, SecretStoreError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for ScriptedStore {
    async fn get_secret(&self, _name: &str, _decrypt: bool) -> Result<String, SecretStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SecretStoreError::Backend("script exhausted".into())))
    }
}

/// Always fails with a backend error
pub struct FailingStore;

#[async_trait]
impl SecretStore for FailingStore {
    async fn get_secret(&self, _name: &str, _decrypt: bool) -> Result<String, SecretStoreError> {
        Err(SecretStoreError::Backend("connection refused".into()))
    }
}

/// Answers after a delay
pub struct SlowStore {
    delay: Duration,
    value: String,
    calls: AtomicUsize,
}

impl SlowStore {
    pub fn new(delay: Duration, value: &str) -> Self {
        Self {
            delay,
            value: value.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for SlowStore {
    async fn get_secret(&self, _name: &str, _decrypt: bool) -> Result<String, SecretStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.value.clone())
    }
}
