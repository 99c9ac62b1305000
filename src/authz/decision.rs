//! Authorization decisions

use crate::auth::AuthError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Principal id reported on every Deny
pub const ANONYMOUS_PRINCIPAL: &str = "user";

/// Context key carrying the deny reason
pub const CONTEXT_ERROR_TYPE: &str = "errorType";

/// Context key set on Allow
pub const CONTEXT_AUTHENTICATED: &str = "authenticated";

/// Policy effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one authorization request
///
/// Built fresh per request and never mutated after it is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    principal_id: String,
    effect: Effect,
    context: BTreeMap<String, String>,
}

impl Decision {
    /// Allow `principal_id`
    pub fn allow(principal_id: impl Into<String>) -> Self {
        let mut context = BTreeMap::new();
        context.insert(CONTEXT_AUTHENTICATED.to_string(), "true".to_string());
        Self {
            principal_id: principal_id.into(),
            effect: Effect::Allow,
            context,
        }
    }

    /// Deny with the error's machine-readable reason
    pub fn deny(error: &AuthError) -> Self {
        let mut context = BTreeMap::new();
        context.insert(
            CONTEXT_ERROR_TYPE.to_string(),
            error.error_type().to_string(),
        );
        Self {
            principal_id: ANONYMOUS_PRINCIPAL.to_string(),
            effect: Effect::Deny,
            context,
        }
    }

    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }

    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// Deny reason, if this is a Deny
    pub fn error_type(&self) -> Option<&str> {
        self.context.get(CONTEXT_ERROR_TYPE).map(String::as_str)
    }
}
