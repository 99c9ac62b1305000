//! Principal id derivation
//!
//! The principal id is the first 8 bytes of SHA-256 over the credential,
//! hex encoded and tagged with `user-`. It is stable per credential and
//! used only to correlate audit logs.

use sha2::{Digest, Sha256};

/// Tag prepended to every principal id
pub const PRINCIPAL_PREFIX: &str = "user-";

/// Number of digest bytes kept (16 hex characters)
const DIGEST_BYTES: usize = 8;

/// Derive the pseudonymous principal id for a credential
pub fn principal_id(credential: &str) -> String {
    let digest = Sha256::digest(credential.as_bytes());
    format!("{}{}", PRINCIPAL_PREFIX, hex::encode(&digest[..DIGEST_BYTES]))
}
