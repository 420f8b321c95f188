use std::sync::Arc;

use handler_lifecycle_core::contract::HttpResponse;
use handler_lifecycle_core::HandlerConfig;
use handler_lifecycle_lambda::adapters::invocation::{build_context, run_http};
use handler_lifecycle_lambda::adapters::logging::init_logging;
use handler_lifecycle_lambda::handlers::profile::UpdateProfile;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(
    config: Arc<HandlerConfig>,
    event: LambdaEvent<Value>,
) -> Result<HttpResponse, Error> {
    let context = build_context(&event.context, config);
    Ok(run_http(context, event.payload, UpdateProfile).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Arc::new(HandlerConfig::from_env()?);
    init_logging(config.log_format);
    tracing::info!(
        service = %config.service_name,
        stage = %config.stage,
        trigger = "http",
        "lambda runtime starting"
    );

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        handle_request(config.clone(), event)
    }))
    .await
}
