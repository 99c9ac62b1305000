//! Credential extraction
//!
//! Looks for the credential in the `X-Client-Token` header first and falls
//! back to `Authorization: Bearer <token>`. Header names are matched
//! case-insensitively; the `Bearer ` prefix itself is literal.

use super::{AuthRequest, Credential};

/// Primary header carrying the shared secret
pub const CLIENT_TOKEN_HEADER: &str = "x-client-token";

/// Fallback header
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Required prefix on the fallback header (the space is significant)
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extract the presented credential, or `None` when absent
///
/// Surrounding whitespace is trimmed and a blank value counts as absent.
pub fn extract_credential(request: &AuthRequest) -> Option<Credential> {
    if let Some(token) = request
        .header(CLIENT_TOKEN_HEADER)
        .and_then(non_blank)
    {
        return Some(Credential::new(token));
    }

    request
        .header(AUTHORIZATION_HEADER)
        .and_then(|auth| auth.strip_prefix(BEARER_PREFIX))
        .and_then(non_blank)
        .map(Credential::new)
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
