use std::sync::Arc;

use handler_lifecycle_core::contract::IdentityEvent;
use handler_lifecycle_core::HandlerConfig;
use handler_lifecycle_lambda::adapters::invocation::{build_context, run_identity};
use handler_lifecycle_lambda::adapters::logging::init_logging;
use handler_lifecycle_lambda::handlers::pre_sign_up::PreSignUp;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(
    config: Arc<HandlerConfig>,
    trigger: Arc<PreSignUp>,
    event: LambdaEvent<Value>,
) -> Result<IdentityEvent, Error> {
    let context = build_context(&event.context, config);
    run_identity(context, event.payload, trigger.as_ref().clone()).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Arc::new(HandlerConfig::from_env()?);
    init_logging(config.log_format);
    tracing::info!(
        service = %config.service_name,
        stage = %config.stage,
        trigger = "identity",
        "lambda runtime starting"
    );
    let trigger = Arc::new(PreSignUp::from_env());

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        handle_request(config.clone(), trigger.clone(), event)
    }))
    .await
}
