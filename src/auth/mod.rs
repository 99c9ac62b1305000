//! Authentication module
//!
//! Credential extraction from request headers and the pseudonymous
//! principal id derived from a validated credential.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod extractor;
pub mod principal;

pub use extractor::{extract_credential, BEARER_PREFIX, CLIENT_TOKEN_HEADER};
pub use principal::{principal_id, PRINCIPAL_PREFIX};

/// Machine-readable reasons placed in the decision context on Deny
pub const ERR_MISSING_TOKEN: &str = "missing_token";
pub const ERR_TOKEN_MISMATCH: &str = "token_mismatch";
pub const ERR_SSM_FAILURE: &str = "ssm_failure";

/// Per-request authentication errors
///
/// None of these carry credential or secret material; the messages are
/// safe to log as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing credential")]
    MissingCredential,

    #[error("Credential mismatch")]
    CredentialMismatch,

    #[error("Secret store unavailable: {0}")]
    SecretStoreUnavailable(String),

    #[error("Secret store returned an empty value for {0}")]
    SecretStoreEmptyValue(String),
}

impl AuthError {
    /// The `errorType` value reported in the decision context
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => ERR_MISSING_TOKEN,
            AuthError::CredentialMismatch => ERR_TOKEN_MISMATCH,
            AuthError::SecretStoreUnavailable(_) | AuthError::SecretStoreEmptyValue(_) => {
                ERR_SSM_FAILURE
            }
        }
    }
}

/// A credential presented by a caller
///
/// Debug output is redacted so the value cannot leak through `{:?}`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a credential value; callers are expected to have trimmed it
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact byte comparison against the canonical secret
    pub fn matches(&self, canonical: &str) -> bool {
        self.0.as_bytes() == canonical.as_bytes()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Authorization request as received from the request router
///
/// Header names are normalized to lowercase once, at construction, so
/// every later lookup is a plain map access.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    headers: HashMap<String, String>,
    resource: String,
}

impl AuthRequest {
    /// Build a request from raw headers (any case) and the resource identifier
    ///
    /// When the same header appears under several casings, the first
    /// non-blank value wins.
    pub fn new<I, K, V>(headers: I, resource: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut normalized: HashMap<String, String> = HashMap::new();
        for (name, value) in headers {
            let value = value.into();
            let key = name.as_ref().to_ascii_lowercase();
            match normalized.get(&key) {
                Some(existing) if !existing.trim().is_empty() => {}
                _ => {
                    normalized.insert(key, value);
                }
            }
        }

        Self {
            headers: normalized,
            resource: resource.into(),
        }
    }

    /// Look up a header by name, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Resource identifier, echoed back in the policy
    pub fn resource(&self) -> &str {
        &self.resource
    }
}
