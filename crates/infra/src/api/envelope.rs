//! Decoding of backend response bodies
//!
//! Responses are decoded exactly once here so callers see either an
//! [`ApiResponse`] or a typed [`ClearHoldError`], never a raw body.

use clearhold_domain::{ApiResponse, ClearHoldError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Decode a 2xx body
///
/// Empty bodies yield `data: None`. A body that is itself an envelope
/// (`success` flag present) is returned as the backend sent it, including
/// `success: false`. Otherwise `data` is taken from the `data` field when
/// present and from the whole body when not.
pub fn decode_success<T>(body: &str) -> Result<ApiResponse<T>>
where
    T: DeserializeOwned,
{
    if body.trim().is_empty() {
        return Ok(ApiResponse::ok(None, None));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|err| ClearHoldError::Internal(format!("response is not valid JSON: {err}")))?;

    let Value::Object(mut fields) = value else {
        return Ok(ApiResponse::ok(decode_data(value)?, None));
    };

    let message = take_string(&mut fields, "message");
    if let Some(success) = fields.get("success").and_then(Value::as_bool) {
        let data = fields.remove("data").map(decode_data).transpose()?.flatten();
        let error = take_string(&mut fields, "error");
        return Ok(ApiResponse { success, data, message, error });
    }

    let data = match fields.remove("data") {
        Some(data) => decode_data(data)?,
        None => {
            if let Some(message) = &message {
                fields.insert("message".into(), Value::String(message.clone()));
            }
            decode_data(Value::Object(fields))?
        }
    };
    Ok(ApiResponse::ok(data, message))
}

/// Decode a non-2xx body into [`ClearHoldError::Api`]
///
/// The message prefers the body's `message`, then `error`; bodies that are
/// not JSON objects fall back to the raw text or a status line.
pub fn decode_error(status: u16, body: &str) -> ClearHoldError {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let fields = parsed.as_ref().and_then(Value::as_object);

    let code = fields
        .and_then(|f| f.get("code"))
        .and_then(|code| match code {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

    let message = fields
        .and_then(|f| {
            f.get("message")
                .and_then(Value::as_str)
                .or_else(|| f.get("error").and_then(Value::as_str))
        })
        .map(str::to_string)
        .or_else(|| {
            let text = body.trim();
            (fields.is_none() && !text.is_empty() && text.len() <= 200).then(|| text.to_string())
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    ClearHoldError::api(status, code, message)
}

fn decode_data<T>(value: Value) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|err| ClearHoldError::Internal(format!("unexpected response shape: {err}")))
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Escrow {
        id: String,
    }

    #[test]
    fn test_envelope_is_unwrapped() {
        let body = json!({"success": true, "data": {"id": "e1"}, "message": "ok"}).to_string();
        let response: ApiResponse<Escrow> = decode_success(&body).unwrap();

        assert!(response.success);
        assert_eq!(response.data, Some(Escrow { id: "e1".into() }));
        assert_eq!(response.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_bare_body_becomes_data() {
        let response: ApiResponse<Escrow> = decode_success(r#"{"id": "e2"}"#).unwrap();
        assert_eq!(response.data, Some(Escrow { id: "e2".into() }));

        let list: ApiResponse<Vec<u32>> = decode_success("[1, 2]").unwrap();
        assert_eq!(list.data, Some(vec![1, 2]));
    }

    #[test]
    fn test_empty_body_has_no_data() {
        let response: ApiResponse<Value> = decode_success("").unwrap();
        assert!(response.success);
        assert!(response.data.is_none());
    }

    #[test]
    fn test_failed_envelope_is_returned_as_is() {
        let body = json!({"success": false, "error": "limit reached"}).to_string();
        let response: ApiResponse<Value> = decode_success(&body).unwrap();

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("limit reached"));
    }

    #[test]
    fn test_shape_mismatch_is_internal() {
        let result: Result<ApiResponse<Escrow>> = decode_success(r#"{"data": 5}"#);
        assert!(matches!(result, Err(ClearHoldError::Internal(_))));
    }

    #[test]
    fn test_error_body_decoding() {
        let body = json!({
            "error": "bad_request",
            "message": "Email already in use",
            "code": "auth/email"
        });
        let err = decode_error(400, &body.to_string());
        assert_eq!(
            err,
            ClearHoldError::api(400, Some("auth/email".into()), "Email already in use")
        );

        let err = decode_error(404, r#"{"error": "Not found"}"#);
        assert_eq!(err.user_message(), "Not found");

        let err = decode_error(502, "Bad Gateway");
        assert_eq!(err.user_message(), "Bad Gateway");

        let err = decode_error(500, "");
        assert_eq!(err.user_message(), "Request failed with status 500");
    }
}
