use std::borrow::Cow;
use std::collections::BTreeMap;

use base64::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

pub type Headers = BTreeMap<String, String>;
pub type Parameters = BTreeMap<String, String>;

/// Proxy-style HTTP request as delivered by the hosting platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub http_method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Headers,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: Parameters,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path_parameters: Parameters,
    #[serde(default)]
    pub request_context: Value,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters.get(name).map(String::as_str)
    }

    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_string_parameters.get(name).map(String::as_str)
    }

    /// Returns the raw body, base64-decoding it first when the platform
    /// flagged it as encoded.
    pub fn decoded_body(&self) -> Result<Option<Cow<'_, str>>, ParseError> {
        let Some(body) = self.body.as_deref() else {
            return Ok(None);
        };
        if !self.is_base64_encoded {
            return Ok(Some(Cow::Borrowed(body)));
        }

        let bytes = BASE64_STANDARD
            .decode(body)
            .map_err(|error| ParseError::InvalidEncoding {
                reason: error.to_string(),
            })?;
        String::from_utf8(bytes)
            .map(|text| Some(Cow::Owned(text)))
            .map_err(|error| ParseError::InvalidEncoding {
                reason: error.to_string(),
            })
    }
}

/// Case-insensitive header lookup.
pub fn header_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Copy of a request with the raw body replaced by its parsed mapping. Built
/// only for schema validation; serializes with the request's own field names.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub http_method: String,
    pub path: String,
    pub headers: Headers,
    pub query_string_parameters: Parameters,
    pub path_parameters: Parameters,
    pub request_context: Value,
    pub body: Map<String, Value>,
    pub is_base64_encoded: bool,
}

impl RequestView {
    pub fn derive(request: &HttpRequest, body: Map<String, Value>) -> Self {
        let HttpRequest {
            http_method,
            path,
            headers,
            query_string_parameters,
            path_parameters,
            request_context,
            body: _,
            is_base64_encoded,
        } = request.clone();
        Self {
            http_method,
            path,
            headers,
            query_string_parameters,
            path_parameters,
            request_context,
            body,
            is_base64_encoded,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInput {
    pub status_code: u16,
    pub body: Option<Value>,
    pub headers: Headers,
}

impl ResponseInput {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            body: Some(body),
            headers: Headers::new(),
        }
    }

    pub fn empty(status_code: u16) -> Self {
        Self {
            status_code,
            body: None,
            headers: Headers::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Headers,
    pub body: String,
    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
}

impl HttpResponse {
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallerContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_sdk_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identity-provider lifecycle trigger record. Absent fields stay absent and
/// unknown fields are carried through untouched, so an event that is not
/// amended serializes back to the payload the provider sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityEvent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trigger_source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_pool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_context: Option<CallerContext>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub request: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub response: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdentityEvent {
    pub fn user_attribute(&self, name: &str) -> Option<&str> {
        self.request
            .get("userAttributes")
            .and_then(|attributes| attributes.get(name))
            .and_then(Value::as_str)
    }

    pub fn set_response_field(&mut self, key: impl Into<String>, value: Value) {
        if !self.response.is_object() {
            self.response = Value::Object(Map::new());
        }
        if let Value::Object(fields) = &mut self.response {
            fields.insert(key.into(), value);
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
