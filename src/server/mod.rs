//! HTTP server module
//!
//! Exposes the authorizer to a request router.
//!
//! # Endpoints
//!
//! * `POST /authorize` - body `{"headers": {...}, "methodArn": "..."}`,
//!   answers with the policy response JSON (200 for Allow and Deny alike)
//! * `GET /health` - `{"status":"ok"}`
//!
//! The optional `X-Request-Deadline-Ms` header gives the caller's remaining
//! processing budget in milliseconds; it bounds the secret store fetch.

use crate::auth::AuthRequest;
use crate::authz::{Authorizer, PolicyResponse};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

pub mod http;

use self::http::{json_response, text_response};

/// Header carrying the caller's remaining budget in milliseconds
pub const DEADLINE_HEADER: &str = "x-request-deadline-ms";

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),
}

/// Body of `POST /authorize`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub method_arn: String,
}

impl From<AuthorizeRequest> for AuthRequest {
    fn from(req: AuthorizeRequest) -> Self {
        AuthRequest::new(req.headers, req.method_arn)
    }
}

/// HTTP front door
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    authorizer: Arc<dyn Authorizer>,
}

impl Server {
    /// Bind to `address`
    pub async fn bind(address: &str, authorizer: Arc<dyn Authorizer>) -> Result<Self, ServerError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ServerError::BindError(format!("Invalid address: {}", e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {}: {}", addr, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(format!("Failed to get local address: {}", e)))?;

        info!("Server bound to {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            authorizer,
        })
    }

    /// The bound address (useful when binding to port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run until ctrl-c
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
    }

    /// Run until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        info!("Starting authorizer server on {}", self.local_addr);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down server");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };

                    let authorizer = Arc::clone(&self.authorizer);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let authorizer = Arc::clone(&authorizer);
                            async move { handle_request(req, authorizer).await }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            debug!("Error serving connection from {}: {}", peer_addr, e);
                        }
                    });
                }
            }
        }
    }
}

async fn handle_request(
    req: Request<Incoming>,
    authorizer: Arc<dyn Authorizer>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::POST, "/authorize") => authorize_handler(req, authorizer.as_ref()).await,
        (&Method::GET, "/health") => {
            json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
        }
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };
    Ok(response)
}

async fn authorize_handler(
    req: Request<Incoming>,
    authorizer: &dyn Authorizer,
) -> Response<Full<Bytes>> {
    let deadline = request_deadline(&req, Instant::now());

    let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return text_response(StatusCode::BAD_REQUEST, "Unreadable request body"),
    };

    let parsed: AuthorizeRequest = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(_) => return text_response(StatusCode::BAD_REQUEST, "Malformed authorize request"),
    };

    let request = AuthRequest::from(parsed);
    let decision = authorizer.authorize(&request, deadline).await;
    json_response(
        StatusCode::OK,
        &PolicyResponse::from_decision(&decision, request.resource()),
    )
}

/// Deadline from `X-Request-Deadline-Ms`, relative to `now`
fn request_deadline<B>(req: &Request<B>, now: Instant) -> Option<Instant> {
    req.headers()
        .get(DEADLINE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|ms| now + Duration::from_millis(ms))
}
