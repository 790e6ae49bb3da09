//! Access-token claim decoding
//!
//! Reads the JSON payload segment of a JWT-shaped token without verifying the
//! signature. The backend remains the authority on validity; the client only
//! needs `exp` to schedule renewal and the subject to key local state.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use thiserror::Error;

/// Errors produced while decoding token claims
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("invalid token format: expected 3 segments, found {0}")]
    Format(usize),
    #[error("failed to decode token payload: {0}")]
    Encoding(String),
    #[error("failed to parse token payload: {0}")]
    Payload(String),
}

/// Claims the client cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiry as seconds since the UNIX epoch
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl TokenClaims {
    /// Expiry in epoch milliseconds
    pub fn expires_at_millis(&self) -> Option<i64> {
        self.exp.map(|secs| secs.saturating_mul(1000))
    }

    /// First non-empty of `sub`, `user_id`, `uid`
    pub fn subject(&self) -> Option<&str> {
        [self.sub.as_deref(), self.user_id.as_deref(), self.uid.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

/// Decode the payload segment of `token`
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ClaimsError::Format(parts.len()));
    }

    // Some issuers pad the segment even though JWT forbids it
    let segment = parts[1].trim_end_matches('=');
    let payload_bytes =
        URL_SAFE_NO_PAD.decode(segment).map_err(|err| ClaimsError::Encoding(err.to_string()))?;

    serde_json::from_slice(&payload_bytes).map_err(|err| ClaimsError::Payload(err.to_string()))
}

/// Expiry of `token` in epoch ms, or `now_ms + fallback_lifetime_ms` when the
/// claim is missing or the token cannot be decoded
pub fn expiry_or_default(token: &str, now_ms: i64, fallback_lifetime_ms: i64) -> i64 {
    decode_claims(token)
        .ok()
        .and_then(|claims| claims.expires_at_millis())
        .unwrap_or_else(|| now_ms.saturating_add(fallback_lifetime_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_decode_exp_and_subject() {
        let token = token_with(r#"{"exp": 1700000000, "user_id": "u-42", "sub": ""}"#);
        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.expires_at_millis(), Some(1_700_000_000_000));
        assert_eq!(claims.subject(), Some("u-42"));
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        assert_eq!(decode_claims("opaque"), Err(ClaimsError::Format(1)));
        assert!(matches!(decode_claims("a.%%%.c"), Err(ClaimsError::Encoding(_))));
        assert!(matches!(
            decode_claims(&format!("a.{}.c", URL_SAFE_NO_PAD.encode("not json"))),
            Err(ClaimsError::Payload(_))
        ));
    }

    #[test]
    fn test_expiry_falls_back_to_default_lifetime() {
        assert_eq!(expiry_or_default("opaque-token", 1_000, 3_600_000), 3_601_000);

        let no_exp = token_with(r#"{"sub": "u-1"}"#);
        assert_eq!(expiry_or_default(&no_exp, 5, 10), 15);

        let with_exp = token_with(r#"{"exp": 2}"#);
        assert_eq!(expiry_or_default(&with_exp, 5, 10), 2_000);
    }
}
