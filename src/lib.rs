//! Tokengate Library
//!
//! Shared-secret request authorizer backed by AWS SSM Parameter Store.
//!
//! # Features
//!
//! - **Single Secret**: Validates `X-Client-Token` / `Authorization: Bearer`
//!   against one canonical secret
//! - **Cached**: The secret is cached with a TTL and refreshed lazily
//! - **Resilient**: A circuit breaker stops hammering a failing store and
//!   the last known secret keeps being served meanwhile
//! - **Audit Friendly**: Allowed callers are identified by a hashed
//!   principal id; raw secrets are never logged
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokengate::auth::AuthRequest;
//! use tokengate::authz::{Authorizer, TokenAuthorizer};
//! use tokengate::cache::TokenCache;
//! use tokengate::config::Config;
//! use tokengate::secrets::SsmSecretStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = SsmSecretStore::new(&config.secret_store).await?;
//!     let cache = TokenCache::new(
//!         config.token_cache_config(),
//!         Arc::new(store),
//!         Arc::new(config.circuit_breaker()),
//!     );
//!     let authorizer = TokenAuthorizer::new(Arc::new(cache));
//!
//!     let request = AuthRequest::new([("X-Client-Token", "secret123")], "arn:...");
//!     let decision = authorizer.authorize(&request, None).await;
//!     println!("{}", decision.effect());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod authz;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod secrets;
pub mod server;

// Re-export commonly used types
pub use authz::{Decision, Effect, TokenAuthorizer};
pub use config::Config;
pub use server::Server;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
