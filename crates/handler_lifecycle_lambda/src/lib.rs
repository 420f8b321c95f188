//! Lambda runtime adapters and concrete handlers built on the invocation
//! lifecycle.
//!
//! This crate owns runtime integration details (context bootstrap, logging
//! setup, event decoding) and the business handlers bound to each trigger.
//! Lifecycle semantics live in `handler_lifecycle_core`.

pub mod adapters;
pub mod handlers;
