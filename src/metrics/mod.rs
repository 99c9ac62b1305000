//! Metrics module
//!
//! Provides Prometheus metrics for authorization decisions, secret fetches
//! and circuit breaker transitions.

pub mod server;

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Histogram,
};

lazy_static! {
    // Decision metrics
    pub static ref DECISIONS_TOTAL: CounterVec = register_counter_vec!(
        "tokengate_decisions_total",
        "Authorization decisions",
        &["effect", "reason"]
    ).unwrap();

    // Secret store metrics
    pub static ref SECRET_FETCHES_TOTAL: CounterVec = register_counter_vec!(
        "tokengate_secret_fetches_total",
        "Secret store fetch attempts",
        &["status"]  // "success", "failure", "empty" or "timeout"
    ).unwrap();

    pub static ref SECRET_FETCH_DURATION: Histogram = register_histogram!(
        "tokengate_secret_fetch_duration_seconds",
        "Secret store fetch duration in seconds",
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0]
    ).unwrap();

    pub static ref STALE_SERVED_TOTAL: Counter = register_counter!(
        "tokengate_stale_served_total",
        "Requests served from an expired cached secret"
    ).unwrap();

    // Circuit breaker metrics
    pub static ref BREAKER_TRANSITIONS_TOTAL: CounterVec = register_counter_vec!(
        "tokengate_breaker_transitions_total",
        "Circuit breaker state transitions",
        &["state"]
    ).unwrap();
}

/// Record an authorization decision
///
/// `reason` is the deny `errorType`, or "none" on Allow.
pub fn record_decision(effect: &str, reason: &str) {
    DECISIONS_TOTAL.with_label_values(&[effect, reason]).inc();
}

/// Record a secret store fetch
pub fn record_secret_fetch(status: &str, duration_secs: f64) {
    SECRET_FETCHES_TOTAL.with_label_values(&[status]).inc();
    SECRET_FETCH_DURATION.observe(duration_secs);
}

/// Record a request answered with a stale secret
pub fn record_stale_served() {
    STALE_SERVED_TOTAL.inc();
}

/// Record a breaker transition ("open" or "closed")
pub fn record_breaker_transition(state: &str) {
    BREAKER_TRANSITIONS_TOTAL.with_label_values(&[state]).inc();
}
