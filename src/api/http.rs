//! Request headers, quota signals, and status classification.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::error::{Operation, RapportError};

/// Header carrying the credential on authenticated endpoints.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the remaining quota for the called operation.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header correlating a request with server logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Default headers for a JSON request, with the credential when given.
pub fn api_headers(api_key: Option<&str>, request_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key {
        if let Ok(val) = HeaderValue::from_str(key) {
            headers.insert(API_KEY_HEADER, val);
        }
    }
    if let Ok(val) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, val);
    }
    headers
}

/// Remaining quota from the response header, if present and numeric.
pub fn remaining_from_headers(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(REMAINING_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_number)
}

/// Remaining quota from a top-level `remaining` field of a JSON body.
pub fn remaining_from_body(body: &str) -> Option<i64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let remaining = value.get("remaining")?;
    remaining
        .as_i64()
        .or_else(|| remaining.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

fn parse_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64)
    })
}

/// Map a non-200 status to a typed error.
///
/// 429 is ambiguous on the wire; `quota_exhausted` is the caller's last known
/// counter for the operation and decides between quota and rate limiting.
pub fn status_to_error(
    operation: Operation,
    status: u16,
    body: &str,
    quota_exhausted: bool,
) -> RapportError {
    match status {
        400 => RapportError::BadRequest {
            operation,
            message: error_message(body),
        },
        401 => RapportError::Authentication {
            operation,
            message: error_message(body),
        },
        429 if quota_exhausted => RapportError::QuotaExceeded { operation },
        429 => RapportError::RateLimited { operation },
        502 => RapportError::Upstream { operation },
        500..=599 => RapportError::Server { operation, status },
        _ => RapportError::Api {
            operation,
            status,
            message: error_message(body),
        },
    }
}

/// Best-effort human message from an error body.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let error = v.get("error").or_else(|| v.get("message"))?;
            match error {
                serde_json::Value::String(s) => Some(s.clone()),
                other => other
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
            }
        });
    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "no details provided".to_string(),
        None => crate::util::text::truncate_chars(body.trim(), 200),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_key_and_request_id() {
        let headers = api_headers(Some("rk-1"), "req-1");
        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "rk-1");
        assert_eq!(headers.get(REQUEST_ID_HEADER).unwrap(), "req-1");
        assert!(api_headers(None, "req-2").get(API_KEY_HEADER).is_none());
    }

    #[test]
    fn remaining_header_must_be_numeric() {
        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("17"));
        assert_eq!(remaining_from_headers(&headers), Some(17));
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("lots"));
        assert_eq!(remaining_from_headers(&headers), None);
    }

    #[test]
    fn remaining_body_field_is_read() {
        assert_eq!(remaining_from_body(r#"{"text":"x","remaining":4}"#), Some(4));
        assert_eq!(remaining_from_body(r#"{"remaining":"4"}"#), None);
        assert_eq!(remaining_from_body("not json"), None);
    }

    #[test]
    fn status_table() {
        let op = Operation::Message;
        assert!(matches!(
            status_to_error(op, 400, r#"{"error":"content missing"}"#, false),
            RapportError::BadRequest { message, .. } if message == "content missing"
        ));
        assert!(matches!(
            status_to_error(op, 401, "", false),
            RapportError::Authentication { .. }
        ));
        assert!(matches!(
            status_to_error(op, 429, "", true),
            RapportError::QuotaExceeded { .. }
        ));
        assert!(matches!(
            status_to_error(op, 429, "", false),
            RapportError::RateLimited { .. }
        ));
        assert!(matches!(
            status_to_error(op, 500, "", false),
            RapportError::Server { status: 500, .. }
        ));
        assert!(matches!(
            status_to_error(op, 502, "", false),
            RapportError::Upstream { .. }
        ));
        assert!(matches!(
            status_to_error(op, 503, "", false),
            RapportError::Server { status: 503, .. }
        ));
        assert!(matches!(
            status_to_error(op, 418, "teapot", false),
            RapportError::Api { status: 418, message, .. } if message == "teapot"
        ));
    }

    #[test]
    fn errors_are_prefixed_with_operation() {
        let err = status_to_error(Operation::Sort, 429, "", false);
        assert!(err.to_string().starts_with("sort:"), "{err}");
    }
}
