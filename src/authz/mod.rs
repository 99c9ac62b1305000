//! Authorization module
//!
//! Turns an incoming request into an Allow/Deny decision by comparing the
//! presented credential with the cached canonical secret.
//!
//! Flow: extract credential, get canonical secret from the cache (which
//! may fetch through the circuit breaker), compare, hash the principal on
//! Allow, build the decision. Every per-request failure becomes a Deny
//! carrying an `errorType`; nothing is returned as an error.

use crate::auth::{extract_credential, principal_id, AuthError, AuthRequest};
use crate::cache::{CacheError, TokenCache};
use crate::metrics;
use crate::secrets::SecretStoreError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod decision;
pub mod policy;

pub use decision::{Decision, Effect};
pub use policy::{PolicyDocument, PolicyResponse, PolicyStatement};

impl From<CacheError> for AuthError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Fetch(SecretStoreError::Empty(name)) => {
                AuthError::SecretStoreEmptyValue(name)
            }
            other => AuthError::SecretStoreUnavailable(other.to_string()),
        }
    }
}

/// Authorizer trait
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Decide on a request; `deadline` bounds any remote work
    async fn authorize(&self, request: &AuthRequest, deadline: Option<Instant>) -> Decision;
}

/// Shared-secret authorizer
pub struct TokenAuthorizer {
    cache: Arc<TokenCache>,
}

impl TokenAuthorizer {
    pub fn new(cache: Arc<TokenCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    async fn validate(
        &self,
        request: &AuthRequest,
        deadline: Option<Instant>,
    ) -> Result<String, AuthError> {
        let credential = extract_credential(request).ok_or(AuthError::MissingCredential)?;
        let expected = self.cache.get_at(Instant::now(), deadline).await?;

        // Never log either value, only the outcome
        if !credential.matches(&expected) {
            return Err(AuthError::CredentialMismatch);
        }
        Ok(principal_id(credential.as_str()))
    }
}

#[async_trait]
impl Authorizer for TokenAuthorizer {
    async fn authorize(&self, request: &AuthRequest, deadline: Option<Instant>) -> Decision {
        debug!(resource = %request.resource(), "Authorizer invoked");

        let decision = match self.validate(request, deadline).await {
            Ok(principal) => {
                info!(principal_id = %principal, "Authorization granted");
                Decision::allow(principal)
            }
            Err(e @ AuthError::SecretStoreUnavailable(_))
            | Err(e @ AuthError::SecretStoreEmptyValue(_)) => {
                warn!(error_type = e.error_type(), error = %e, "Authorization denied");
                Decision::deny(&e)
            }
            Err(e) => {
                info!(error_type = e.error_type(), "Authorization denied");
                Decision::deny(&e)
            }
        };

        metrics::record_decision(
            decision.effect().as_str(),
            decision.error_type().unwrap_or("none"),
        );
        decision
    }
}
