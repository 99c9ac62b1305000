//! Secret caching and circuit breaking
//!
//! `TokenCache` and `CircuitBreaker` are constructed once at startup and
//! shared by reference across all requests.

pub mod breaker;
pub mod token;

pub use breaker::{BreakerStatus, CircuitBreaker, DEFAULT_COOL_DOWN, DEFAULT_FAILURE_THRESHOLD};
pub use token::{CacheError, TokenCache, TokenCacheConfig, DEFAULT_FETCH_TIMEOUT, DEFAULT_TTL};
