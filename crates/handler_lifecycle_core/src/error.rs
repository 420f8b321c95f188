//! Error taxonomy for handler invocations.
//!
//! Mediators fail with their own narrow error type; the HTTP variant lifts
//! them into [`HandlerError`], which is the only error the orchestrator sees.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Message carried by the error synthesized for panicking handlers.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Schema mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    pub fn with_violations(message: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self {
            message: message.into(),
            violations,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut violations = Vec::new();
        collect_violations("", &errors, &mut violations);
        violations.sort_by(|left, right| left.path.cmp(&right.path));
        Self::with_violations("Request failed validation", violations)
    }
}

fn collect_violations(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<Violation>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            validator::ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| format!("failed `{}` check", error.code));
                    out.push(Violation::new(path.clone(), message));
                }
            }
            validator::ValidationErrorsKind::Struct(nested) => {
                collect_violations(&path, nested, out);
            }
            validator::ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_violations(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

/// Malformed request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Malformed JSON body: {reason}")]
    MalformedJson { reason: String },

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    #[error("Request body is not valid encoded text: {reason}")]
    InvalidEncoding { reason: String },
}

/// Caller lacks the roles an operation requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("Request carries no identity claims")]
    Unauthenticated,

    #[error("No role satisfies an empty role requirement")]
    NoRolesRequired,

    #[error("Caller holds none of the required roles: {}", required.join(", "))]
    MissingRole { required: Vec<String> },
}

/// Failure raised on purpose by business logic to produce a specific
/// client-visible response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RejectedError {
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl RejectedError {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, "not_found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, "conflict", message)
    }
}

/// Any other error raised by business logic. Cloning shares the same
/// underlying instance.
#[derive(Clone)]
pub struct DomainError {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
}

impl DomainError {
    pub fn new(error: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(error),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    pub fn is_same_instance(&self, other: &DomainError) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DomainError").field(&self.inner).finish()
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for DomainError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for MessageError {}

#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Rejected(#[from] RejectedError),

    #[error("Unknown error occurred")]
    Unknown,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl HandlerError {
    pub fn domain(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Domain(DomainError::new(error))
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::Domain(DomainError::message(message))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Parse(_) => "parse_error",
            Self::Authorization(_) => "authorization_error",
            Self::Rejected(_) => "rejected_error",
            Self::Unknown => "unknown_error",
            Self::Domain(_) => "domain_error",
        }
    }

    /// True when both values wrap the identical domain error instance.
    /// Non-domain errors are compared by value.
    pub fn is_same_instance(&self, other: &HandlerError) -> bool {
        match (self, other) {
            (Self::Domain(left), Self::Domain(right)) => left.is_same_instance(right),
            (Self::Validation(left), Self::Validation(right)) => left == right,
            (Self::Parse(left), Self::Parse(right)) => left == right,
            (Self::Authorization(left), Self::Authorization(right)) => left == right,
            (Self::Rejected(left), Self::Rejected(right)) => left == right,
            (Self::Unknown, Self::Unknown) => true,
            _ => false,
        }
    }
}
