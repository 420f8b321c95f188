mod support;

use handler_lifecycle_core::contract::IdentityEvent;
use handler_lifecycle_core::error::HandlerError;
use handler_lifecycle_core::test_helpers::{identity_event, recording_context, LogLevel};
use handler_lifecycle_core::{IdentityHandler, Lifecycle};
use serde_json::json;
use support::{PassThrough, Script, ScriptedIdentity};

#[tokio::test]
async fn success_returns_the_amended_event() {
    let (context, logger) = recording_context();
    let event = identity_event("PreSignUp_SignUp", "ada@example.com");
    let handler = IdentityHandler::new(
        context,
        event.clone(),
        ScriptedIdentity(Script::Succeed(json!({"autoConfirmUser": true}))),
    );

    let returned = handler.execute().await.expect("trigger should succeed");

    assert_eq!(returned.response, json!({"autoConfirmUser": true}));
    assert_eq!(returned.request, event.request);
    assert_eq!(returned.user_pool_id, event.user_pool_id);
    assert_eq!(logger.count(LogLevel::Error), 0);
}

#[tokio::test]
async fn untouched_event_goes_back_exactly_as_received() {
    let (context, _logger) = recording_context();
    let raw = json!({
        "version": "1",
        "triggerSource": "PreSignUp_SignUp",
        "region": "r",
        "userPoolId": "p",
        "callerContext": {}
    });
    let event: IdentityEvent = serde_json::from_value(raw.clone()).expect("event should parse");

    let returned = IdentityHandler::new(context, event, PassThrough)
        .execute()
        .await
        .expect("trigger should succeed");

    assert_eq!(
        serde_json::to_value(&returned).expect("event should serialize"),
        raw
    );
}

#[tokio::test]
async fn failure_re_raises_the_identical_error() {
    let (context, logger) = recording_context();
    let original = HandlerError::message("invalid token");
    let handler = IdentityHandler::new(
        context,
        identity_event("PreAuthentication_Authentication", "ada@example.com"),
        ScriptedIdentity(Script::Fail(original.clone())),
    );

    let error = handler.execute().await.expect_err("trigger should fail");

    assert!(error.is_same_instance(&original));
    assert_eq!(error.to_string(), "invalid token");
    assert_eq!(logger.count(LogLevel::Error), 1);
}

#[tokio::test]
async fn failure_log_includes_the_original_event() {
    let (context, logger) = recording_context();
    let event = identity_event("PreSignUp_SignUp", "mallory@blocked.test");
    IdentityHandler::new(
        context,
        event.clone(),
        ScriptedIdentity(Script::Fail(HandlerError::message("blocked domain"))),
    )
    .execute()
    .await
    .expect_err("trigger should fail");

    let entry = logger
        .entries()
        .into_iter()
        .find(|entry| entry.level == LogLevel::Error)
        .expect("error was logged");
    assert_eq!(entry.meta["error"], "blocked domain");
    assert_eq!(
        entry.meta["event"],
        serde_json::to_value(&event).expect("event serializes")
    );
}

#[tokio::test]
async fn panic_escalates_as_unknown_error() {
    let (context, logger) = recording_context();
    let error = IdentityHandler::new(
        context,
        identity_event("PreSignUp_SignUp", "ada@example.com"),
        ScriptedIdentity(Script::Panic("boom")),
    )
    .execute()
    .await
    .expect_err("trigger should fail");

    assert!(matches!(error, HandlerError::Unknown));
    assert!(!error.to_string().contains("boom"));
    assert_eq!(logger.count(LogLevel::Warn), 1);
    assert_eq!(logger.count(LogLevel::Error), 1);
}
