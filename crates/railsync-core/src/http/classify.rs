//! Response classification
//!
//! One pipeline turns a raw `RestResponse` into either the parsed JSON body
//! or the appropriate error kind. Both execution modes route through here,
//! so synchronous and asynchronous callers see identical classification.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::http::transport::RestResponse;

/// HTTP status Rails uses for validation failures.
const UNPROCESSABLE_ENTITY: u16 = 422;

/// Classify a response: 2xx parses the body as JSON (empty body becomes
/// `null`), 422 decodes the per-field validation payload, and any other
/// status is surfaced with its code and raw body.
pub fn classify_response(response: &RestResponse) -> Result<Value> {
    if (200..300).contains(&response.status) {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&response.body).map_err(|e| Error::LocalMapping {
            message: format!("2xx response body is not valid JSON: {e}"),
        });
    }

    if response.status == UNPROCESSABLE_ENTITY {
        if let Some(errors) = parse_validation_errors(&response.body) {
            return Err(Error::RemoteValidation { errors });
        }
    }

    Err(Error::RemoteStatus {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Decode a `{"field": ["reason", ...]}` validation payload, either at the
/// top level or under an `"errors"` key.
fn parse_validation_errors(body: &str) -> Option<HashMap<String, Vec<String>>> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let map = match parsed.get("errors") {
        Some(Value::Object(inner)) => inner,
        _ => parsed.as_object()?,
    };
    let errors = collect_reasons(map);
    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

fn collect_reasons(map: &Map<String, Value>) -> HashMap<String, Vec<String>> {
    let mut errors = HashMap::new();
    for (field, reasons) in map {
        if let Value::Array(reasons) = reasons {
            let reasons: Vec<String> = reasons
                .iter()
                .filter_map(|r| r.as_str().map(str::to_string))
                .collect();
            if !reasons.is_empty() {
                errors.insert(field.clone(), reasons);
            }
        }
    }
    errors
}
