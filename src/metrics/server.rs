//! Prometheus Metrics HTTP Server
//!
//! Serves `/metrics` for scraping and `/health`, which also reports the
//! circuit breaker state when a breaker is attached.
//!
//! # Example
//!
//! ```no_run
//! use tokengate::metrics::server::{MetricsServer, MetricsServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MetricsServerConfig {
//!         address: "127.0.0.1:9090".to_string(),
//!     };
//!     let mut server = MetricsServer::new(config);
//!     let addr = server.start().await?;
//!     println!("Metrics server listening on {}", addr);
//!     Ok(())
//! }
//! ```

use crate::cache::{BreakerStatus, CircuitBreaker};
use crate::server::http::{json_response, text_response};
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, TextEncoder};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::debug;

/// Configuration for the metrics server
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind to (e.g., "127.0.0.1:9090")
    pub address: String,
}

/// Metrics server error
#[derive(Debug, thiserror::Error)]
pub enum MetricsServerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Prometheus metrics HTTP server
pub struct MetricsServer {
    config: MetricsServerConfig,
    breaker: Option<Arc<CircuitBreaker>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MetricsServer {
    /// Create a new metrics server
    pub fn new(config: MetricsServerConfig) -> Self {
        Self {
            config,
            breaker: None,
            shutdown_tx: None,
            server_handle: None,
        }
    }

    /// Report this breaker's state on `/health`
    #[must_use]
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Start the metrics server
    ///
    /// Returns the actual bound address (useful when using port 0)
    pub async fn start(&mut self) -> Result<SocketAddr, MetricsServerError> {
        let listener = TcpListener::bind(&self.config.address).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let breaker = self.breaker.clone();
        let handle = tokio::spawn(async move {
            run_server(listener, breaker, shutdown_rx).await;
        });
        self.server_handle = Some(handle);

        Ok(addr)
    }

    /// Shutdown the metrics server
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }
}

async fn run_server(
    listener: TcpListener,
    breaker: Option<Arc<CircuitBreaker>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let breaker = breaker.clone();
                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                handle_request(req, breaker.clone())
                            });
                            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                debug!(error = %e, "Metrics connection closed with error");
                            }
                        });
                    }
                    Err(_) => continue,
                }
            }
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    breaker: Option<Arc<CircuitBreaker>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => metrics_handler(),
        (&Method::GET, "/health") => health_handler(breaker.as_deref()),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };
    Ok(response)
}

fn metrics_handler() -> Response<Full<Bytes>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        );
    }

    let mut response = Response::new(Full::new(Bytes::from(buffer)));
    if let Ok(value) = encoder.format_type().parse() {
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_TYPE, value);
    }
    response
}

fn health_handler(breaker: Option<&CircuitBreaker>) -> Response<Full<Bytes>> {
    let body = match breaker.map(|b| b.status_at(Instant::now())) {
        Some(BreakerStatus::Open) => serde_json::json!({"status": "ok", "breaker": "open"}),
        Some(_) => serde_json::json!({"status": "ok", "breaker": "closed"}),
        None => serde_json::json!({"status": "ok"}),
    };
    json_response(StatusCode::OK, &body)
}
