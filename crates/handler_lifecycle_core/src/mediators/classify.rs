use std::sync::Arc;

use serde_json::{json, Value};

use super::{ErrorClassifier, ResponseFormatter};
use crate::context::Context;
use crate::contract::{HttpRequest, HttpResponse, ResponseInput};
use crate::error::{AuthorizationError, HandlerError, ParseError};

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Maps each error kind to a status code and a client-safe body.
#[derive(Clone)]
pub struct StatusErrorClassifier {
    formatter: Arc<dyn ResponseFormatter>,
}

impl StatusErrorClassifier {
    pub fn new(formatter: Arc<dyn ResponseFormatter>) -> Self {
        Self { formatter }
    }
}

impl ErrorClassifier for StatusErrorClassifier {
    fn handle(&self, context: &Context, error: &HandlerError, _event: &HttpRequest) -> HttpResponse {
        let (status_code, mut body) = classify(error);
        if let Value::Object(fields) = &mut body {
            fields.insert(
                "request_id".to_string(),
                Value::String(context.request_id().to_string()),
            );
        }
        self.formatter.format(ResponseInput::new(status_code, body))
    }
}

fn classify(error: &HandlerError) -> (u16, Value) {
    match error {
        HandlerError::Validation(validation) => (
            400,
            json!({
                "error": "validation_error",
                "message": validation.message(),
                "violations": validation.violations(),
            }),
        ),
        HandlerError::Parse(parse @ ParseError::UnsupportedContentType { .. }) => (
            415,
            json!({
                "error": "unsupported_media_type",
                "message": parse.to_string(),
            }),
        ),
        HandlerError::Parse(parse) => (
            400,
            json!({
                "error": "malformed_body",
                "message": parse.to_string(),
            }),
        ),
        HandlerError::Authorization(AuthorizationError::Unauthenticated) => (
            401,
            json!({
                "error": "unauthorized",
                "message": "Authentication is required",
            }),
        ),
        HandlerError::Authorization(_) => (
            403,
            json!({
                "error": "forbidden",
                "message": "Access to this resource is denied",
            }),
        ),
        HandlerError::Rejected(rejected) if (400..500).contains(&rejected.status) => (
            rejected.status,
            json!({
                "error": rejected.code,
                "message": rejected.message,
            }),
        ),
        HandlerError::Rejected(_) | HandlerError::Unknown | HandlerError::Domain(_) => (
            500,
            json!({
                "error": "internal_error",
                "message": INTERNAL_ERROR_MESSAGE,
            }),
        ),
    }
}
