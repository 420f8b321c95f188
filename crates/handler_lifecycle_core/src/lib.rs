//! Handler lifecycle primitives for event-driven compute invocations.
//!
//! This crate owns the invocation template (`lifecycle`), its HTTP and
//! identity-provider variants, and the mediator contracts those variants call
//! for validation, parsing, authorization, formatting and error
//! classification. It intentionally excludes the Lambda runtime itself; see
//! `handler_lifecycle_lambda` for the runtime boundary.

pub mod context;
pub mod contract;
pub mod error;
pub mod http_handler;
pub mod identity_handler;
pub mod lifecycle;
pub mod mediators;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use context::{Context, ContextBuilder, HandlerConfig, Logger};
pub use error::HandlerError;
pub use http_handler::{HttpHandler, HttpLogic};
pub use identity_handler::{IdentityHandler, IdentityLogic};
pub use lifecycle::{InvocationState, Lifecycle};
