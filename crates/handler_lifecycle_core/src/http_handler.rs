//! Request/response variant of the invocation lifecycle.
//!
//! Every failure resolves to a response: `handle_error` logs once and hands
//! the error to the classifier, which is total.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::context::Context;
use crate::contract::{Headers, HttpRequest, HttpResponse, RequestView, ResponseInput};
use crate::error::{AuthorizationError, HandlerError, ValidationError, Violation};
use crate::lifecycle::Lifecycle;
use crate::mediators::{HttpMediators, Schema};

pub const HTTP_TRIGGER: &str = "http";

/// Business logic bound to an HTTP trigger.
#[async_trait]
pub trait HttpLogic: Send + Sync + Sized {
    /// Schema bound to every handler built for this logic.
    fn schema(&self) -> Arc<dyn Schema>;

    async fn handle(&self, http: &HttpHandler<Self>) -> Result<HttpResponse, HandlerError>;
}

pub struct HttpHandler<L> {
    context: Arc<Context>,
    event: HttpRequest,
    schema: Arc<dyn Schema>,
    mediators: HttpMediators,
    logic: L,
}

impl<L: HttpLogic> HttpHandler<L> {
    pub fn new(context: Arc<Context>, event: HttpRequest, logic: L) -> Self {
        let mediators = HttpMediators::from_config(context.config());
        let schema = logic.schema();
        Self {
            context,
            event,
            schema,
            mediators,
            logic,
        }
    }

    pub fn with_mediators(mut self, mediators: HttpMediators) -> Self {
        self.mediators = mediators;
        self
    }

    pub fn event(&self) -> &HttpRequest {
        &self.event
    }

    /// Fails unless the caller holds at least one of `roles`. An empty
    /// requirement never passes.
    pub async fn check_access(&self, roles: &[&str]) -> Result<(), HandlerError> {
        if roles.is_empty() {
            return Err(AuthorizationError::NoRolesRequired.into());
        }
        self.mediators
            .authorizer
            .check_access(&self.context, &self.event, roles)
            .await?;
        Ok(())
    }

    pub fn parse_json_body(
        &self,
        body: Option<&str>,
        headers: &Headers,
    ) -> Result<Map<String, Value>, HandlerError> {
        let fields = self
            .mediators
            .body_parser
            .parse(&self.context, body, headers)?;
        Ok(fields)
    }

    /// Validates a derived view of the event, with the body replaced by its
    /// parsed mapping, against the bound schema.
    pub async fn parse_schema<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let body = self.event.decoded_body()?;
        let fields = match body.as_deref() {
            Some(text) => self.parse_json_body(Some(text), &self.event.headers)?,
            None => Map::new(),
        };
        let view = RequestView::derive(&self.event, fields);

        let validated = self
            .mediators
            .validator
            .validate(&self.context, self.schema.as_ref(), &view)
            .await?;
        serde_json::from_value(validated).map_err(|error| {
            ValidationError::with_violations(
                format!("Request does not match schema '{}'", self.schema.name()),
                vec![Violation::new("body", error.to_string())],
            )
            .into()
        })
    }

    pub fn format_response(&self, input: ResponseInput) -> HttpResponse {
        self.mediators.formatter.format(input)
    }
}

#[async_trait]
impl<L: HttpLogic> Lifecycle for HttpHandler<L> {
    type Output = HttpResponse;

    fn context(&self) -> &Context {
        &self.context
    }

    fn trigger(&self) -> &'static str {
        HTTP_TRIGGER
    }

    async fn handle_request(&self) -> Result<HttpResponse, HandlerError> {
        self.logic.handle(self).await
    }

    async fn handle_error(&self, error: HandlerError) -> Result<HttpResponse, HandlerError> {
        self.context.logger().error(
            "invocation failed",
            &json!({
                "trigger": HTTP_TRIGGER,
                "error_kind": error.kind(),
                "error": error.to_string(),
                "method": self.event.http_method,
                "path": self.event.path,
            }),
        );
        Ok(self
            .mediators
            .classifier
            .handle(&self.context, &error, &self.event))
    }
}
