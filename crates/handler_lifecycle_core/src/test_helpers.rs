//! Test helpers for common handler setup and log inspection.
//!
//! This module provides shared fixtures so lifecycle tests across crates do
//! not each rebuild contexts and events by hand.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::context::{Context, HandlerConfig, Logger};
use crate::contract::{Headers, HttpRequest, IdentityEvent, CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE};

pub const TEST_REQUEST_ID: &str = "test-request";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub meta: Value,
}

/// Logger that keeps every entry in memory.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLogger {
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("poisoned mutex").clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str, meta: &Value) {
        self.entries.lock().expect("poisoned mutex").push(LogEntry {
            level,
            message: message.to_string(),
            meta: meta.clone(),
        });
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str, meta: &Value) {
        self.push(LogLevel::Info, message, meta);
    }

    fn warn(&self, message: &str, meta: &Value) {
        self.push(LogLevel::Warn, message, meta);
    }

    fn error(&self, message: &str, meta: &Value) {
        self.push(LogLevel::Error, message, meta);
    }
}

/// Context wired to a fresh [`RecordingLogger`], returned alongside it.
pub fn recording_context() -> (Arc<Context>, Arc<RecordingLogger>) {
    recording_context_with(HandlerConfig::default())
}

pub fn recording_context_with(config: HandlerConfig) -> (Arc<Context>, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let context = Context::builder(Arc::new(config))
        .request_id(TEST_REQUEST_ID)
        .logger(logger.clone())
        .build();
    (Arc::new(context), logger)
}

pub fn json_request(body: Option<&str>) -> HttpRequest {
    HttpRequest {
        http_method: "POST".to_string(),
        path: "/test".to_string(),
        headers: Headers::from([(CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string())]),
        body: body.map(str::to_string),
        ..Default::default()
    }
}

/// Adds authorizer claims carrying `roles` in the default role claim.
pub fn with_roles(mut request: HttpRequest, roles: &[&str]) -> HttpRequest {
    request.request_context = json!({
        "authorizer": {"claims": {"sub": "user-1", "cognito:groups": roles}}
    });
    request
}

pub fn identity_event(trigger_source: &str, email: &str) -> IdentityEvent {
    IdentityEvent {
        version: "1".to_string(),
        trigger_source: trigger_source.to_string(),
        region: "eu-west-1".to_string(),
        user_pool_id: "eu-west-1_test".to_string(),
        user_name: Some("test-user".to_string()),
        request: json!({"userAttributes": {"email": email}}),
        response: json!({}),
        ..Default::default()
    }
}
