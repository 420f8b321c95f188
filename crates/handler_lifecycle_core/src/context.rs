//! Per-invocation context container and handler configuration.
//!
//! A [`Context`] is built once by the invocation bootstrap, shared as
//! `Arc<Context>` for the lifetime of one invocation, and never mutated by the
//! orchestrator.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::Extensions;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_SERVICE_NAME: &str = "handler";
pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_ROLE_CLAIM: &str = "cognito:groups";

/// Best-effort structured logger. Implementations must not fail or panic.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str, meta: &Value);
    fn warn(&self, message: &str, meta: &Value);
    fn error(&self, message: &str, meta: &Value);
}

/// Forwards log calls to `tracing`, tagged with the invocation identity.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    service: String,
    request_id: String,
}

impl TracingLogger {
    pub fn new(service: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            request_id: request_id.into(),
        }
    }
}

impl Logger for TracingLogger {
    fn info(&self, message: &str, meta: &Value) {
        tracing::info!(
            service = %self.service,
            request_id = %self.request_id,
            meta = %meta,
            "{message}"
        );
    }

    fn warn(&self, message: &str, meta: &Value) {
        tracing::warn!(
            service = %self.service,
            request_id = %self.request_id,
            meta = %meta,
            "{message}"
        );
    }

    fn error(&self, message: &str, meta: &Value) {
        tracing::error!(
            service = %self.service,
            request_id = %self.request_id,
            meta = %meta,
            "{message}"
        );
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} has unsupported value '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub service_name: String,
    pub stage: String,
    pub log_format: LogFormat,
    pub cors_allow_origin: Option<String>,
    pub role_claim: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            stage: DEFAULT_STAGE.to_string(),
            log_format: LogFormat::default(),
            cors_allow_origin: None,
            role_claim: DEFAULT_ROLE_CLAIM.to_string(),
        }
    }
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            service_name: read("AWS_LAMBDA_FUNCTION_NAME").unwrap_or(defaults.service_name),
            stage: read("STAGE").unwrap_or(defaults.stage),
            log_format: read("LOG_FORMAT")
                .map(|value| value.parse())
                .transpose()?
                .unwrap_or(defaults.log_format),
            cors_allow_origin: read("CORS_ALLOW_ORIGIN"),
            role_claim: read("ROLE_CLAIM").unwrap_or(defaults.role_claim),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationMetadata {
    pub request_id: String,
    pub function_arn: Option<String>,
    pub received_at: DateTime<Utc>,
}

pub struct Context {
    logger: Arc<dyn Logger>,
    config: Arc<HandlerConfig>,
    invocation: InvocationMetadata,
    services: Extensions,
}

impl Context {
    pub fn builder(config: Arc<HandlerConfig>) -> ContextBuilder {
        ContextBuilder {
            config,
            logger: None,
            request_id: None,
            function_arn: None,
            received_at: None,
            services: Extensions::new(),
        }
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn invocation(&self) -> &InvocationMetadata {
        &self.invocation
    }

    pub fn request_id(&self) -> &str {
        &self.invocation.request_id
    }

    /// Looks up a domain client registered by the bootstrap.
    pub fn service<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.services.get::<T>()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("invocation", &self.invocation)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

pub struct ContextBuilder {
    config: Arc<HandlerConfig>,
    logger: Option<Arc<dyn Logger>>,
    request_id: Option<String>,
    function_arn: Option<String>,
    received_at: Option<DateTime<Utc>>,
    services: Extensions,
}

impl ContextBuilder {
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn function_arn(mut self, function_arn: impl Into<String>) -> Self {
        self.function_arn = Some(function_arn.into());
        self
    }

    pub fn received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = Some(received_at);
        self
    }

    pub fn service<T: Clone + Send + Sync + 'static>(mut self, service: T) -> Self {
        self.services.insert(service);
        self
    }

    pub fn build(self) -> Context {
        let request_id = self.request_id.unwrap_or_else(|| "local".to_string());
        let logger = self.logger.unwrap_or_else(|| {
            Arc::new(TracingLogger::new(
                self.config.service_name.clone(),
                request_id.clone(),
            ))
        });

        Context {
            logger,
            config: self.config,
            invocation: InvocationMetadata {
                request_id,
                function_arn: self.function_arn,
                received_at: self.received_at.unwrap_or_else(Utc::now),
            },
            services: self.services,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn config_defaults_when_environment_is_empty() {
        let config = HandlerConfig::from_lookup(lookup(&[])).expect("config should load");
        assert_eq!(config, HandlerConfig::default());
    }

    #[test]
    fn config_reads_overrides_and_ignores_blank_values() {
        let config = HandlerConfig::from_lookup(lookup(&[
            ("AWS_LAMBDA_FUNCTION_NAME", "profile-api"),
            ("STAGE", "  "),
            ("LOG_FORMAT", "Pretty"),
            ("CORS_ALLOW_ORIGIN", "https://app.example.com"),
            ("ROLE_CLAIM", "roles"),
        ]))
        .expect("config should load");

        assert_eq!(config.service_name, "profile-api");
        assert_eq!(config.stage, DEFAULT_STAGE);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(
            config.cors_allow_origin.as_deref(),
            Some("https://app.example.com")
        );
        assert_eq!(config.role_claim, "roles");
    }

    #[test]
    fn config_rejects_unknown_log_format() {
        let error = HandlerConfig::from_lookup(lookup(&[("LOG_FORMAT", "xml")]))
            .expect_err("config should fail");
        assert_eq!(
            error,
            ConfigError::InvalidValue {
                key: "LOG_FORMAT",
                value: "xml".to_string(),
            }
        );
    }

    #[derive(Debug, Clone, PartialEq)]
    struct TableName(&'static str);

    #[test]
    fn context_exposes_registered_services() {
        let context = Context::builder(Arc::new(HandlerConfig::default()))
            .request_id("req-1")
            .service(TableName("profiles"))
            .build();

        assert_eq!(context.request_id(), "req-1");
        assert_eq!(context.service::<TableName>(), Some(&TableName("profiles")));
        assert_eq!(context.service::<String>(), None);
    }
}
