use serde_json::{Map, Value};

use super::BodyParser;
use crate::context::Context;
use crate::contract::{header_value, Headers, CONTENT_TYPE_HEADER};
use crate::error::ParseError;

/// Parses JSON object bodies. An absent or blank body is an empty mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyParser;

impl BodyParser for JsonBodyParser {
    fn parse(
        &self,
        _context: &Context,
        body: Option<&str>,
        headers: &Headers,
    ) -> Result<Map<String, Value>, ParseError> {
        let Some(text) = body.filter(|text| !text.trim().is_empty()) else {
            return Ok(Map::new());
        };

        if let Some(content_type) = header_value(headers, CONTENT_TYPE_HEADER) {
            if !is_json_content_type(content_type) {
                return Err(ParseError::UnsupportedContentType {
                    content_type: content_type.to_string(),
                });
            }
        }

        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(_) => Err(ParseError::NotAnObject),
            Err(error) => Err(ParseError::MalformedJson {
                reason: error.to_string(),
            }),
        }
    }
}

/// `application/json` or any `+json` structured suffix, ignoring parameters.
pub fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}
