use serde_json::Value;

use super::body::is_json_content_type;
use super::ResponseFormatter;
use crate::context::HandlerConfig;
use crate::contract::{
    header_value, Headers, HttpResponse, ResponseInput, CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE,
};

pub const CORS_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";

/// Serializes bodies as JSON and merges default headers beneath the
/// caller's own.
#[derive(Debug, Clone, Default)]
pub struct JsonResponseFormatter {
    default_headers: Headers,
}

impl JsonResponseFormatter {
    pub fn new(default_headers: Headers) -> Self {
        Self { default_headers }
    }

    pub fn from_config(config: &HandlerConfig) -> Self {
        let mut default_headers = Headers::new();
        if let Some(origin) = &config.cors_allow_origin {
            default_headers.insert(CORS_ORIGIN_HEADER.to_string(), origin.clone());
        }
        Self::new(default_headers)
    }
}

impl ResponseFormatter for JsonResponseFormatter {
    fn format(&self, input: ResponseInput) -> HttpResponse {
        let mut headers = self.default_headers.clone();
        for (name, value) in input.headers {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            headers.insert(name, value);
        }

        let body = match input.body {
            None => String::new(),
            Some(Value::String(text)) if declares_non_json(&headers) => text,
            Some(value) => value.to_string(),
        };
        if !body.is_empty() && header_value(&headers, CONTENT_TYPE_HEADER).is_none() {
            headers.insert(CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string());
        }

        HttpResponse {
            status_code: input.status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }
}

/// Text bodies pass through verbatim only under an explicit non-JSON type.
fn declares_non_json(headers: &Headers) -> bool {
    header_value(headers, CONTENT_TYPE_HEADER).is_some_and(|value| !is_json_content_type(value))
}
