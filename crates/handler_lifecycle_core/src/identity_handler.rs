//! Identity-provider trigger variant.
//!
//! Success hands the (possibly amended) event back to the provider. Failure is
//! logged with the original event and then re-raised unchanged, so the
//! provider rejects the operation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::context::Context;
use crate::contract::IdentityEvent;
use crate::error::HandlerError;
use crate::lifecycle::Lifecycle;

pub const IDENTITY_TRIGGER: &str = "identity";

#[async_trait]
pub trait IdentityLogic: Send + Sync + Sized {
    /// Returns the event to hand back to the provider. The original stays
    /// untouched; amendments go on a copy.
    async fn handle(
        &self,
        identity: &IdentityHandler<Self>,
    ) -> Result<IdentityEvent, HandlerError>;
}

pub struct IdentityHandler<L> {
    context: Arc<Context>,
    event: IdentityEvent,
    logic: L,
}

impl<L: IdentityLogic> IdentityHandler<L> {
    pub fn new(context: Arc<Context>, event: IdentityEvent, logic: L) -> Self {
        Self {
            context,
            event,
            logic,
        }
    }

    pub fn event(&self) -> &IdentityEvent {
        &self.event
    }
}

#[async_trait]
impl<L: IdentityLogic> Lifecycle for IdentityHandler<L> {
    type Output = IdentityEvent;

    fn context(&self) -> &Context {
        &self.context
    }

    fn trigger(&self) -> &'static str {
        IDENTITY_TRIGGER
    }

    async fn handle_request(&self) -> Result<IdentityEvent, HandlerError> {
        self.logic.handle(self).await
    }

    async fn handle_error(&self, error: HandlerError) -> Result<IdentityEvent, HandlerError> {
        self.context.logger().error(
            "identity trigger failed",
            &json!({
                "trigger": IDENTITY_TRIGGER,
                "trigger_source": self.event.trigger_source,
                "error_kind": error.kind(),
                "error": error.to_string(),
                "event": self.event,
            }),
        );
        Err(error)
    }
}
