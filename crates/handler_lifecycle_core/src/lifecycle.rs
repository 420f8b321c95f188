//! Invocation template shared by every trigger variant.
//!
//! `execute` logs the start of an invocation, runs `handle_request`, and on
//! failure routes exactly once to the variant's `handle_error`. A panic inside
//! `handle_request` stands in for a thrown non-error value: its payload is
//! logged as a diagnostic and a generic [`HandlerError::Unknown`] is forwarded
//! instead.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::json;
use tracing::{Instrument, Span};

use crate::context::Context;
use crate::error::HandlerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Created,
    Running,
    Succeeded,
    FailedHandled,
    FailedEscalated,
}

impl InvocationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::FailedHandled => "failed_handled",
            Self::FailedEscalated => "failed_escalated",
        }
    }

    fn after_error_handling<T>(resolution: &Result<T, HandlerError>) -> Self {
        if resolution.is_ok() {
            Self::FailedHandled
        } else {
            Self::FailedEscalated
        }
    }
}

#[async_trait]
pub trait Lifecycle: Send + Sync {
    type Output: Send;

    fn context(&self) -> &Context;

    /// Short label for the trigger shape, used in logs.
    fn trigger(&self) -> &'static str;

    async fn handle_request(&self) -> Result<Self::Output, HandlerError>;

    /// Resolves a failure to a final output or escalates it. Must emit the
    /// invocation's single error log.
    async fn handle_error(&self, error: HandlerError) -> Result<Self::Output, HandlerError>;

    /// Runs one invocation. Consumes the instance; variants should not
    /// override this.
    async fn execute(self) -> Result<Self::Output, HandlerError>
    where
        Self: Sized,
    {
        let span = tracing::info_span!(
            "invocation",
            trigger = self.trigger(),
            request_id = %self.context().request_id(),
            state = InvocationState::Created.as_str(),
        );
        run_template(&self, span.clone()).instrument(span).await
    }
}

async fn run_template<L: Lifecycle>(
    lifecycle: &L,
    span: Span,
) -> Result<L::Output, HandlerError> {
    let context = lifecycle.context();
    let logger = context.logger();
    let trigger = lifecycle.trigger();

    record_state(&span, InvocationState::Running);
    logger.info(
        "invocation started",
        &json!({
            "trigger": trigger,
            "request_id": context.request_id(),
        }),
    );

    let started_at = Instant::now();
    let attempt = AssertUnwindSafe(lifecycle.handle_request())
        .catch_unwind()
        .await;

    let error = match attempt {
        Ok(Ok(output)) => {
            record_state(&span, InvocationState::Succeeded);
            logger.info(
                "invocation succeeded",
                &json!({
                    "trigger": trigger,
                    "duration_ms": started_at.elapsed().as_millis() as u64,
                }),
            );
            return Ok(output);
        }
        Ok(Err(error)) => error,
        Err(payload) => {
            logger.warn(
                "handler raised a non-error value",
                &json!({
                    "trigger": trigger,
                    "value": panic_payload_text(payload.as_ref()),
                }),
            );
            HandlerError::Unknown
        }
    };

    let resolution = lifecycle.handle_error(error).await;
    record_state(&span, InvocationState::after_error_handling(&resolution));
    resolution
}

fn record_state(span: &Span, state: InvocationState) {
    span.record("state", state.as_str());
}

fn panic_payload_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        return (*text).to_string();
    }
    if let Some(text) = payload.downcast_ref::<String>() {
        return text.clone();
    }
    "non-string panic payload".to_string()
}
