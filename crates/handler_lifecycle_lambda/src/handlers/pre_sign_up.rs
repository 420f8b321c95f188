use async_trait::async_trait;
use handler_lifecycle_core::contract::IdentityEvent;
use handler_lifecycle_core::error::HandlerError;
use handler_lifecycle_core::{IdentityHandler, IdentityLogic};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignUpRejection {
    #[error("sign-up requires an email attribute")]
    MissingEmail,

    #[error("email domain '{domain}' is not allowed")]
    DomainNotAllowed { domain: String },
}

/// Pre-sign-up trigger: restricts sign-ups to allow-listed e-mail domains and
/// auto-confirms the rest. An empty allow-list admits every domain.
#[derive(Debug, Clone, Default)]
pub struct PreSignUp {
    allowed_domains: Vec<String>,
}

impl PreSignUp {
    pub fn new<I, S>(allowed_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|domain| domain.as_ref().trim().to_ascii_lowercase())
                .filter(|domain| !domain.is_empty())
                .collect(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the comma-separated `ALLOWED_EMAIL_DOMAINS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let raw = lookup("ALLOWED_EMAIL_DOMAINS").unwrap_or_default();
        Self::new(raw.split(','))
    }

    pub fn check_email(&self, email: &str) -> Result<(), SignUpRejection> {
        let domain = email
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if self.allowed_domains.is_empty() || self.allowed_domains.contains(&domain) {
            return Ok(());
        }
        Err(SignUpRejection::DomainNotAllowed { domain })
    }
}

#[async_trait]
impl IdentityLogic for PreSignUp {
    async fn handle(
        &self,
        identity: &IdentityHandler<Self>,
    ) -> Result<IdentityEvent, HandlerError> {
        let email = identity
            .event()
            .user_attribute("email")
            .ok_or(SignUpRejection::MissingEmail)
            .map_err(HandlerError::domain)?;
        self.check_email(email).map_err(HandlerError::domain)?;

        let mut event = identity.event().clone();
        event.set_response_field("autoConfirmUser", Value::Bool(true));
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use handler_lifecycle_core::test_helpers::{identity_event, recording_context, LogLevel};
    use handler_lifecycle_core::Lifecycle;
    use serde_json::json;

    use super::*;

    #[test]
    fn allow_list_is_read_from_environment() {
        let trigger = PreSignUp::from_lookup(|key| {
            (key == "ALLOWED_EMAIL_DOMAINS").then(|| " Example.com, ,corp.test".to_string())
        });

        assert!(trigger.check_email("ada@EXAMPLE.com").is_ok());
        assert!(trigger.check_email("bob@corp.test").is_ok());
        assert_eq!(
            trigger.check_email("eve@evil.test"),
            Err(SignUpRejection::DomainNotAllowed {
                domain: "evil.test".to_string(),
            })
        );
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        assert!(PreSignUp::default().check_email("anyone@anywhere.test").is_ok());
    }

    #[tokio::test]
    async fn allowed_sign_up_is_auto_confirmed() {
        let (context, _logger) = recording_context();
        let event = identity_event("PreSignUp_SignUp", "ada@example.com");

        let returned = IdentityHandler::new(context, event.clone(), PreSignUp::new(["example.com"]))
            .execute()
            .await
            .expect("sign-up should pass");

        assert_eq!(returned.response, json!({"autoConfirmUser": true}));
        assert_eq!(returned.request, event.request);
    }

    #[tokio::test]
    async fn blocked_domain_rejects_the_sign_up() {
        let (context, logger) = recording_context();
        let error = IdentityHandler::new(
            context,
            identity_event("PreSignUp_SignUp", "eve@evil.test"),
            PreSignUp::new(["example.com"]),
        )
        .execute()
        .await
        .expect_err("sign-up should fail");

        let HandlerError::Domain(domain_error) = &error else {
            panic!("expected a domain error, got {error:?}");
        };
        assert_eq!(
            domain_error.downcast_ref::<SignUpRejection>(),
            Some(&SignUpRejection::DomainNotAllowed {
                domain: "evil.test".to_string(),
            })
        );
        assert_eq!(logger.count(LogLevel::Error), 1);
    }

    #[tokio::test]
    async fn missing_email_rejects_the_sign_up() {
        let (context, _logger) = recording_context();
        let mut event = identity_event("PreSignUp_SignUp", "ada@example.com");
        event.request = json!({"userAttributes": {}});

        let error = IdentityHandler::new(context, event, PreSignUp::default())
            .execute()
            .await
            .expect_err("sign-up should fail");
        assert_eq!(error.to_string(), "sign-up requires an email attribute");
    }
}
