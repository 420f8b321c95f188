use std::sync::Arc;

use chrono::Utc;
use handler_lifecycle_core::contract::{HttpRequest, HttpResponse, IdentityEvent, ResponseInput};
use handler_lifecycle_core::error::HandlerError;
use handler_lifecycle_core::mediators::classify::INTERNAL_ERROR_MESSAGE;
use handler_lifecycle_core::mediators::{JsonResponseFormatter, ResponseFormatter};
use handler_lifecycle_core::{
    Context, HandlerConfig, HttpHandler, HttpLogic, IdentityHandler, IdentityLogic, Lifecycle,
};
use lambda_runtime::Error;
use serde_json::{json, Value};

/// Builds the per-invocation context from the runtime's invocation record.
pub fn build_context(
    lambda_context: &lambda_runtime::Context,
    config: Arc<HandlerConfig>,
) -> Arc<Context> {
    Arc::new(
        Context::builder(config)
            .request_id(lambda_context.request_id.clone())
            .function_arn(lambda_context.invoked_function_arn.clone())
            .received_at(Utc::now())
            .build(),
    )
}

/// Runs one HTTP invocation. Always yields a response, including for payloads
/// that are not proxy requests.
pub async fn run_http<L: HttpLogic>(context: Arc<Context>, payload: Value, logic: L) -> HttpResponse {
    let request = match serde_json::from_value::<HttpRequest>(payload) {
        Ok(value) => value,
        Err(error) => {
            context.logger().error(
                "malformed http event",
                &json!({"error": error.to_string()}),
            );
            return fallback_response(
                &context,
                400,
                json!({
                    "error": "validation_error",
                    "message": "Request payload must be a proxy request object",
                }),
            );
        }
    };

    match HttpHandler::new(context.clone(), request, logic).execute().await {
        Ok(response) => response,
        Err(error) => escalated_response(&context, &error),
    }
}

/// Runs one identity trigger invocation; failures surface to the provider.
pub async fn run_identity<L: IdentityLogic>(
    context: Arc<Context>,
    payload: Value,
    logic: L,
) -> Result<IdentityEvent, Error> {
    let event: IdentityEvent = serde_json::from_value(payload)
        .map_err(|error| Error::from(format!("invalid identity event: {error}")))?;

    IdentityHandler::new(context, event, logic)
        .execute()
        .await
        .map_err(Error::from)
}

/// Last-resort answer for an error the HTTP variant failed to resolve.
fn escalated_response(context: &Context, error: &HandlerError) -> HttpResponse {
    context.logger().error(
        "http error handling escalated",
        &json!({
            "error_kind": error.kind(),
            "error": error.to_string(),
        }),
    );
    fallback_response(
        context,
        500,
        json!({
            "error": "internal_error",
            "message": INTERNAL_ERROR_MESSAGE,
        }),
    )
}

fn fallback_response(context: &Context, status_code: u16, mut body: Value) -> HttpResponse {
    if let Value::Object(fields) = &mut body {
        fields.insert(
            "request_id".to_string(),
            Value::String(context.request_id().to_string()),
        );
    }
    JsonResponseFormatter::from_config(context.config()).format(ResponseInput::new(status_code, body))
}
