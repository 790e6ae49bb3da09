//! Integration tests for access-token claim decoding

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use clearhold_common::auth::{decode_claims, expiry_or_default, ClaimsError};

fn jwt(payload: &serde_json::Value) -> String {
    format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload.to_string()))
}

#[test]
fn test_subject_prefers_sub_then_user_id_then_uid() {
    let claims = decode_claims(&jwt(&serde_json::json!({"sub": "s", "uid": "u"}))).unwrap();
    assert_eq!(claims.subject(), Some("s"));

    let claims = decode_claims(&jwt(&serde_json::json!({"uid": "u"}))).unwrap();
    assert_eq!(claims.subject(), Some("u"));

    let claims = decode_claims(&jwt(&serde_json::json!({"exp": 1}))).unwrap();
    assert_eq!(claims.subject(), None);
}

#[test]
fn test_padded_payload_segment_is_accepted() {
    let payload = serde_json::json!({"exp": 1_800_000_000, "email": "a@b.co"}).to_string();
    let token = format!("h.{}.s", URL_SAFE.encode(payload));

    let claims = decode_claims(&token).unwrap();
    assert_eq!(claims.expires_at_millis(), Some(1_800_000_000_000));
    assert_eq!(claims.email.as_deref(), Some("a@b.co"));
}

#[test]
fn test_two_segment_token_is_rejected() {
    assert_eq!(decode_claims("a.b"), Err(ClaimsError::Format(2)));
}

#[test]
fn test_default_expiry_is_one_hour_from_now() {
    let now = 1_700_000_000_000;
    assert_eq!(expiry_or_default("not-a-jwt", now, 3_600_000), now + 3_600_000);
}
