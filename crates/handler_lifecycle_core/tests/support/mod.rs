#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use handler_lifecycle_core::contract::{HttpResponse, IdentityEvent, RequestView, ResponseInput};
use handler_lifecycle_core::error::{HandlerError, ValidationError, Violation};
use handler_lifecycle_core::mediators::{FieldKind, ObjectSchema, Schema};
use handler_lifecycle_core::{
    Context, HttpHandler, HttpLogic, IdentityHandler, IdentityLogic, Lifecycle,
};
use serde_json::{json, Value};

/// What a scripted `handle_request` should do.
#[derive(Clone)]
pub enum Script {
    Succeed(Value),
    Fail(HandlerError),
    Panic(&'static str),
}

/// Minimal lifecycle variant that records every error it is handed.
pub struct ScriptedLifecycle {
    pub context: Arc<Context>,
    pub script: Script,
    pub escalate: bool,
    pub seen_errors: Arc<Mutex<Vec<HandlerError>>>,
}

impl ScriptedLifecycle {
    pub fn new(context: Arc<Context>, script: Script) -> Self {
        Self {
            context,
            script,
            escalate: false,
            seen_errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn escalating(mut self) -> Self {
        self.escalate = true;
        self
    }
}

#[async_trait]
impl Lifecycle for ScriptedLifecycle {
    type Output = Value;

    fn context(&self) -> &Context {
        &self.context
    }

    fn trigger(&self) -> &'static str {
        "scripted"
    }

    async fn handle_request(&self) -> Result<Value, HandlerError> {
        match &self.script {
            Script::Succeed(value) => Ok(value.clone()),
            Script::Fail(error) => Err(error.clone()),
            Script::Panic(payload) => std::panic::panic_any(*payload),
        }
    }

    async fn handle_error(&self, error: HandlerError) -> Result<Value, HandlerError> {
        self.context
            .logger()
            .error("scripted failure", &json!({"error": error.to_string()}));
        self.seen_errors
            .lock()
            .expect("poisoned mutex")
            .push(error.clone());
        if self.escalate {
            Err(error)
        } else {
            Ok(json!({"recovered": true}))
        }
    }
}

/// HTTP logic whose schema requires a numeric `a` field and echoes the
/// validated body.
pub struct EchoCounter;

#[async_trait]
impl HttpLogic for EchoCounter {
    fn schema(&self) -> Arc<dyn Schema> {
        Arc::new(ObjectSchema::new("counter").required("a", FieldKind::Number))
    }

    async fn handle(&self, http: &HttpHandler<Self>) -> Result<HttpResponse, HandlerError> {
        let body: Value = http.parse_schema().await?;
        Ok(http.format_response(ResponseInput::new(200, body)))
    }
}

/// Schema that only admits requests carrying an authorizer `sub` claim and
/// yields that subject.
pub struct SubjectSchema;

impl Schema for SubjectSchema {
    fn name(&self) -> &str {
        "subject"
    }

    fn check(&self, view: &RequestView) -> Result<Value, ValidationError> {
        view.request_context
            .pointer("/authorizer/claims/sub")
            .and_then(Value::as_str)
            .map(|subject| json!({"subject": subject, "method": view.http_method}))
            .ok_or_else(|| {
                ValidationError::with_violations(
                    "Request does not match schema 'subject'",
                    vec![Violation::new("requestContext.authorizer.claims.sub", "is required")],
                )
            })
    }
}

/// HTTP logic that echoes what `SubjectSchema` extracted.
pub struct EchoSubject;

#[async_trait]
impl HttpLogic for EchoSubject {
    fn schema(&self) -> Arc<dyn Schema> {
        Arc::new(SubjectSchema)
    }

    async fn handle(&self, http: &HttpHandler<Self>) -> Result<HttpResponse, HandlerError> {
        let body: Value = http.parse_schema().await?;
        Ok(http.format_response(ResponseInput::new(200, body)))
    }
}

/// HTTP logic bound to a schema with no fields.
pub struct EchoAnything;

#[async_trait]
impl HttpLogic for EchoAnything {
    fn schema(&self) -> Arc<dyn Schema> {
        Arc::new(ObjectSchema::new("anything"))
    }

    async fn handle(&self, http: &HttpHandler<Self>) -> Result<HttpResponse, HandlerError> {
        let body: Value = http.parse_schema().await?;
        Ok(http.format_response(ResponseInput::new(200, body)))
    }
}

/// HTTP logic that fails or panics according to a script.
pub struct ScriptedHttp(pub Script);

#[async_trait]
impl HttpLogic for ScriptedHttp {
    fn schema(&self) -> Arc<dyn Schema> {
        Arc::new(ObjectSchema::new("scripted"))
    }

    async fn handle(&self, http: &HttpHandler<Self>) -> Result<HttpResponse, HandlerError> {
        match &self.0 {
            Script::Succeed(value) => Ok(http.format_response(ResponseInput::new(200, value.clone()))),
            Script::Fail(error) => Err(error.clone()),
            Script::Panic(payload) => std::panic::panic_any(*payload),
        }
    }
}

/// HTTP logic guarded by a role check before any other work.
pub struct AdminOnly(pub Vec<&'static str>);

#[async_trait]
impl HttpLogic for AdminOnly {
    fn schema(&self) -> Arc<dyn Schema> {
        Arc::new(ObjectSchema::new("admin"))
    }

    async fn handle(&self, http: &HttpHandler<Self>) -> Result<HttpResponse, HandlerError> {
        http.check_access(&self.0).await?;
        Ok(http.format_response(ResponseInput::new(200, json!({"ok": true}))))
    }
}

/// Identity logic that fails or amends the event according to a script.
pub struct ScriptedIdentity(pub Script);

#[async_trait]
impl IdentityLogic for ScriptedIdentity {
    async fn handle(
        &self,
        identity: &IdentityHandler<Self>,
    ) -> Result<IdentityEvent, HandlerError> {
        match &self.0 {
            Script::Succeed(value) => {
                let mut event = identity.event().clone();
                event.response = value.clone();
                Ok(event)
            }
            Script::Fail(error) => Err(error.clone()),
            Script::Panic(payload) => std::panic::panic_any(*payload),
        }
    }
}

/// Identity logic that hands the event back without amending it.
pub struct PassThrough;

#[async_trait]
impl IdentityLogic for PassThrough {
    async fn handle(
        &self,
        identity: &IdentityHandler<Self>,
    ) -> Result<IdentityEvent, HandlerError> {
        Ok(identity.event().clone())
    }
}
