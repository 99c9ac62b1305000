//! API gateway policy response
//!
//! Serialized shape of a custom authorizer response:
//!
//! ```json
//! {
//!   "principalId": "user-3f1c...",
//!   "policyDocument": {
//!     "Version": "2012-10-17",
//!     "Statement": [
//!       {"Action": ["execute-api:Invoke"], "Effect": "Allow", "Resource": ["arn:..."]}
//!     ]
//!   },
//!   "context": {"authenticated": "true"}
//! }
//! ```

use super::decision::{Decision, Effect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// Action granted or denied by the policy
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub action: Vec<String>,
    pub effect: Effect,
    pub resource: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResponse {
    pub principal_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_document: Option<PolicyDocument>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl PolicyResponse {
    /// Build the response for `decision` on `resource`
    ///
    /// The policy document is left out when there is no resource to scope
    /// it to.
    pub fn from_decision(decision: &Decision, resource: &str) -> Self {
        let policy_document = (!resource.is_empty()).then(|| PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                action: vec![INVOKE_ACTION.to_string()],
                effect: decision.effect(),
                resource: vec![resource.to_string()],
            }],
        });

        Self {
            principal_id: decision.principal_id().to_string(),
            policy_document,
            context: decision.context().clone(),
        }
    }

    /// Effect of the first statement, if any
    pub fn effect(&self) -> Option<Effect> {
        self.policy_document
            .as_ref()
            .and_then(|doc| doc.statement.first())
            .map(|s| s.effect)
    }
}
