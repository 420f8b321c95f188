//! Narrow, stateless collaborators the HTTP variant delegates to.
//!
//! Each mediator reports failure through its own error type so it can be
//! exercised in isolation; [`crate::http_handler::HttpHandler`] lifts those
//! into [`crate::error::HandlerError`].

pub mod authorization;
pub mod body;
pub mod classify;
pub mod format;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::{Context, HandlerConfig};
use crate::contract::{Headers, HttpRequest, HttpResponse, RequestView, ResponseInput};
use crate::error::{AuthorizationError, HandlerError, ParseError, ValidationError};

pub use authorization::ClaimsAuthorizer;
pub use body::JsonBodyParser;
pub use classify::StatusErrorClassifier;
pub use format::JsonResponseFormatter;
pub use schema::{FieldKind, ObjectSchema, Schema, SchemaCheckValidator, TypedSchema};

#[async_trait]
pub trait SchemaValidator: Send + Sync {
    async fn validate(
        &self,
        context: &Context,
        schema: &dyn Schema,
        view: &RequestView,
    ) -> Result<Value, ValidationError>;
}

pub trait BodyParser: Send + Sync {
    fn parse(
        &self,
        context: &Context,
        body: Option<&str>,
        headers: &Headers,
    ) -> Result<Map<String, Value>, ParseError>;
}

#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn check_access(
        &self,
        context: &Context,
        event: &HttpRequest,
        roles: &[&str],
    ) -> Result<(), AuthorizationError>;
}

/// Pure mapping to the platform response; identical input must yield
/// identical output.
pub trait ResponseFormatter: Send + Sync {
    fn format(&self, input: ResponseInput) -> HttpResponse;
}

/// Total: always produces a response, never fails.
pub trait ErrorClassifier: Send + Sync {
    fn handle(&self, context: &Context, error: &HandlerError, event: &HttpRequest) -> HttpResponse;
}

#[derive(Clone)]
pub struct HttpMediators {
    pub validator: Arc<dyn SchemaValidator>,
    pub body_parser: Arc<dyn BodyParser>,
    pub authorizer: Arc<dyn Authorizer>,
    pub formatter: Arc<dyn ResponseFormatter>,
    pub classifier: Arc<dyn ErrorClassifier>,
}

impl HttpMediators {
    pub fn from_config(config: &HandlerConfig) -> Self {
        let formatter: Arc<dyn ResponseFormatter> =
            Arc::new(JsonResponseFormatter::from_config(config));
        Self {
            validator: Arc::new(SchemaCheckValidator),
            body_parser: Arc::new(JsonBodyParser),
            authorizer: Arc::new(ClaimsAuthorizer::new(config.role_claim.clone())),
            classifier: Arc::new(StatusErrorClassifier::new(formatter.clone())),
            formatter,
        }
    }
}

impl Default for HttpMediators {
    fn default() -> Self {
        Self::from_config(&HandlerConfig::default())
    }
}
