use async_trait::async_trait;
use serde_json::Value;

use super::Authorizer;
use crate::context::Context;
use crate::contract::HttpRequest;
use crate::error::AuthorizationError;

/// Checks roles carried in the authorizer claims of the request context.
#[derive(Debug, Clone)]
pub struct ClaimsAuthorizer {
    claim: String,
}

impl ClaimsAuthorizer {
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
        }
    }

    pub fn held_roles(&self, event: &HttpRequest) -> Option<Vec<String>> {
        let authorizer = event.request_context.get("authorizer")?;
        let claims = authorizer
            .get("claims")
            .or_else(|| authorizer.get("jwt").and_then(|jwt| jwt.get("claims")))?;
        if !claims.is_object() {
            return None;
        }
        Some(claims.get(&self.claim).map(parse_roles).unwrap_or_default())
    }
}

#[async_trait]
impl Authorizer for ClaimsAuthorizer {
    async fn check_access(
        &self,
        _context: &Context,
        event: &HttpRequest,
        roles: &[&str],
    ) -> Result<(), AuthorizationError> {
        if roles.is_empty() {
            return Err(AuthorizationError::NoRolesRequired);
        }

        let held = self
            .held_roles(event)
            .ok_or(AuthorizationError::Unauthenticated)?;
        if roles
            .iter()
            .any(|role| held.iter().any(|name| name.as_str() == *role))
        {
            return Ok(());
        }

        Err(AuthorizationError::MissingRole {
            required: roles.iter().map(|role| role.to_string()).collect(),
        })
    }
}

/// Accepts a JSON array or the flattened string forms `"a,b"` and `"[a b]"`.
fn parse_roles(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(text) => text
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|role| !role.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
