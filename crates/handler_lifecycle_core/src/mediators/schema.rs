use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use super::SchemaValidator;
use crate::context::Context;
use crate::contract::RequestView;
use crate::error::{ValidationError, Violation};

/// Immutable validation contract bound to one HTTP handler. A successful
/// check yields the validated body.
pub trait Schema: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, view: &RequestView) -> Result<Value, ValidationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Any,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any value",
        }
    }
}

#[derive(Debug, Clone)]
struct FieldRule {
    name: String,
    kind: FieldKind,
    required: bool,
}

/// Declarative shape check over the request body and parameters.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    name: String,
    fields: Vec<FieldRule>,
    path_parameters: Vec<String>,
    query_parameters: Vec<String>,
    deny_unknown_fields: bool,
}

impl ObjectSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            path_parameters: Vec::new(),
            query_parameters: Vec::new(),
            deny_unknown_fields: false,
        }
    }

    pub fn required(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    pub fn path_parameter(mut self, name: impl Into<String>) -> Self {
        self.path_parameters.push(name.into());
        self
    }

    pub fn query_parameter(mut self, name: impl Into<String>) -> Self {
        self.query_parameters.push(name.into());
        self
    }

    pub fn deny_unknown_fields(mut self) -> Self {
        self.deny_unknown_fields = true;
        self
    }
}

impl Schema for ObjectSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, view: &RequestView) -> Result<Value, ValidationError> {
        let mut violations = Vec::new();

        for rule in &self.fields {
            let path = format!("body.{}", rule.name);
            match view.body.get(&rule.name) {
                None | Some(Value::Null) if rule.required => {
                    violations.push(Violation::new(path, "is required"));
                }
                None | Some(Value::Null) => {}
                Some(value) if !rule.kind.matches(value) => {
                    violations.push(Violation::new(
                        path,
                        format!("expected {}", rule.kind.label()),
                    ));
                }
                Some(_) => {}
            }
        }

        if self.deny_unknown_fields {
            for key in view.body.keys() {
                if !self.fields.iter().any(|rule| &rule.name == key) {
                    violations.push(Violation::new(format!("body.{key}"), "unknown field"));
                }
            }
        }

        for name in &self.path_parameters {
            if !view.path_parameters.contains_key(name) {
                violations.push(Violation::new(format!("pathParameters.{name}"), "is required"));
            }
        }

        for name in &self.query_parameters {
            if !view.query_string_parameters.contains_key(name) {
                violations.push(Violation::new(
                    format!("queryStringParameters.{name}"),
                    "is required",
                ));
            }
        }

        if !violations.is_empty() {
            return Err(ValidationError::with_violations(
                format!("Request does not match schema '{}'", self.name),
                violations,
            ));
        }

        Ok(Value::Object(view.body.clone()))
    }
}

/// Schema backed by a serde type carrying `validator` rules.
pub struct TypedSchema<T> {
    name: String,
    path_parameters: Vec<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path_parameters: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn path_parameter(mut self, name: impl Into<String>) -> Self {
        self.path_parameters.push(name.into());
        self
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Validate,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, view: &RequestView) -> Result<Value, ValidationError> {
        let missing: Vec<Violation> = self
            .path_parameters
            .iter()
            .filter(|name| !view.path_parameters.contains_key(*name))
            .map(|name| Violation::new(format!("pathParameters.{name}"), "is required"))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::with_violations(
                format!("Request does not match schema '{}'", self.name),
                missing,
            ));
        }

        let body = Value::Object(view.body.clone());
        let typed: T = serde_json::from_value(body.clone()).map_err(|error| {
            ValidationError::with_violations(
                format!("Request does not match schema '{}'", self.name),
                vec![Violation::new("body", error.to_string())],
            )
        })?;
        typed.validate()?;
        Ok(body)
    }
}

/// Default validator: runs the bound schema's own check.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaCheckValidator;

#[async_trait]
impl SchemaValidator for SchemaCheckValidator {
    async fn validate(
        &self,
        _context: &Context,
        schema: &dyn Schema,
        view: &RequestView,
    ) -> Result<Value, ValidationError> {
        schema.check(view)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::{json, Map};

    use super::*;
    use crate::contract::Parameters;

    fn view(body: Value) -> RequestView {
        let body: Map<String, Value> = serde_json::from_value(body).expect("body is an object");
        RequestView {
            body,
            ..Default::default()
        }
    }

    #[test]
    fn object_schema_accepts_matching_body() {
        let schema = ObjectSchema::new("counter").required("a", FieldKind::Number);
        let value = schema.check(&view(json!({"a": 1}))).expect("body should pass");
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn object_schema_without_fields_accepts_empty_body() {
        let schema = ObjectSchema::new("empty");
        assert_eq!(schema.check(&view(json!({}))).expect("body should pass"), json!({}));
    }

    #[test]
    fn object_schema_reports_every_violation() {
        let schema = ObjectSchema::new("profile")
            .required("name", FieldKind::String)
            .required("age", FieldKind::Integer)
            .optional("tags", FieldKind::Array)
            .deny_unknown_fields()
            .path_parameter("user_id");

        let error = schema
            .check(&view(json!({"age": 1.5, "tags": null, "extra": true})))
            .expect_err("body should fail");

        assert_eq!(error.message(), "Request does not match schema 'profile'");
        assert_eq!(
            error.violations(),
            &[
                Violation::new("body.name", "is required"),
                Violation::new("body.age", "expected integer"),
                Violation::new("body.extra", "unknown field"),
                Violation::new("pathParameters.user_id", "is required"),
            ]
        );
    }

    #[test]
    fn object_schema_checks_query_parameters() {
        let schema = ObjectSchema::new("search").query_parameter("q");
        let mut request_view = view(json!({}));
        assert!(schema.check(&request_view).is_err());

        request_view.query_string_parameters = Parameters::from([("q".to_string(), "ada".to_string())]);
        assert!(schema.check(&request_view).is_ok());
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Rename {
        #[validate(length(min = 1, max = 8, message = "must be 1-8 characters"))]
        name: String,
    }

    #[test]
    fn typed_schema_applies_field_rules() {
        let schema = TypedSchema::<Rename>::new("rename");

        assert!(schema.check(&view(json!({"name": "ada"}))).is_ok());

        let error = schema
            .check(&view(json!({"name": "a-very-long-name"})))
            .expect_err("name is too long");
        assert_eq!(error.violations(), &[Violation::new("name", "must be 1-8 characters")]);
    }

    #[test]
    fn typed_schema_reports_shape_mismatch() {
        let schema = TypedSchema::<Rename>::new("rename").path_parameter("user_id");
        let mut request_view = view(json!({"name": 7}));
        request_view.path_parameters = Parameters::from([("user_id".to_string(), "1".to_string())]);

        let error = schema.check(&request_view).expect_err("name has wrong type");
        assert_eq!(error.violations().len(), 1);
        assert_eq!(error.violations()[0].path, "body");
    }
}
