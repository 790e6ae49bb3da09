//! Session types
//!
//! The credential held by the client plus the inputs and outputs of the
//! backend sign-in exchange.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::user::UserProfile;

/// Access token plus its expiry metadata
///
/// `expires_at_epoch_ms` is always derived from the token's own `exp` claim
/// (or "now + 1 hour" when the claim cannot be decoded), never from a
/// server-provided lifetime.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub expires_at_epoch_ms: i64,
    pub subject_id: String,
}

impl Credential {
    #[must_use]
    pub fn new(access_token: String, expires_at_epoch_ms: i64, subject_id: String) -> Self {
        Self { access_token, expires_at_epoch_ms, subject_id }
    }

    /// Epoch millisecond at which the credential should be renewed
    #[must_use]
    pub fn refresh_due_at(&self, buffer_ms: i64) -> i64 {
        self.expires_at_epoch_ms.saturating_sub(buffer_ms)
    }

    /// `now < expires_at - buffer`
    ///
    /// The buffer leaves a grace window so a caller that checks validity and
    /// then sends the token still has time before real expiry.
    #[must_use]
    pub fn is_valid_at(&self, now_ms: i64, buffer_ms: i64) -> bool {
        now_ms < self.refresh_due_at(buffer_ms)
    }

    /// Milliseconds until renewal is due (zero or negative means overdue)
    #[must_use]
    pub fn millis_until_refresh(&self, now_ms: i64, buffer_ms: i64) -> i64 {
        self.refresh_due_at(buffer_ms).saturating_sub(now_ms)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[redacted]")
            .field("expires_at_epoch_ms", &self.expires_at_epoch_ms)
            .field("subject_id", &self.subject_id)
            .finish()
    }
}

/// Ways a user can prove their identity
#[derive(Clone, PartialEq, Eq)]
pub enum SignInSource {
    /// Email and password
    EmailPassword { email: String, password: String },
    /// Passwordless sign-in with the one-time code from an emailed link
    MagicLink { email: String, code: String },
    /// Identity token minted by an external identity provider
    IdToken { id_token: String },
}

impl SignInSource {
    /// Short label for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EmailPassword { .. } => "email_password",
            Self::MagicLink { .. } => "magic_link",
            Self::IdToken { .. } => "id_token",
        }
    }

    /// Email the source claims, if any
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::EmailPassword { email, .. } | Self::MagicLink { email, .. } => Some(email),
            Self::IdToken { .. } => None,
        }
    }
}

impl fmt::Debug for SignInSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInSource")
            .field("kind", &self.kind())
            .field("email", &self.email())
            .finish_non_exhaustive()
    }
}

/// Successful backend sign-in or refresh
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    #[serde(alias = "accessToken", alias = "idToken")]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl fmt::Debug for AuthGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGrant")
            .field("token", &"[redacted]")
            .field("user", &self.user.as_ref().map(|u| &u.uid))
            .finish()
    }
}

/// Point-in-time view of the session for UI shells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_epoch_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_parts(credential: Option<&Credential>, profile: Option<UserProfile>) -> Self {
        match credential {
            Some(c) => Self {
                signed_in: true,
                subject_id: Some(c.subject_id.clone()),
                expires_at_epoch_ms: Some(c.expires_at_epoch_ms),
                profile,
            },
            None => Self::signed_out(),
        }
    }
}

/// Parsed passwordless sign-in callback (`?mode=signIn&oobCode=...`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkCallback {
    pub code: String,
    pub continue_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_uses_buffer() {
        let credential = Credential::new("tok".into(), 1_000_000, "uid-1".into());

        assert!(credential.is_valid_at(699_999, 300_000));
        assert!(!credential.is_valid_at(700_000, 300_000));
        assert!(!credential.is_valid_at(1_000_001, 300_000));
        assert_eq!(credential.millis_until_refresh(600_000, 300_000), 100_000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credential = Credential::new("secret-token".into(), 0, "uid".into());
        assert!(!format!("{credential:?}").contains("secret-token"));

        let source =
            SignInSource::EmailPassword { email: "a@b.co".into(), password: "hunter2".into() };
        let rendered = format!("{source:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("a@b.co"));
    }

    #[test]
    fn test_grant_accepts_token_aliases() {
        let grant: AuthGrant = serde_json::from_str(r#"{"accessToken": "abc"}"#).unwrap();
        assert_eq!(grant.token, "abc");
        assert!(grant.user.is_none());

        let grant: AuthGrant = serde_json::from_str(r#"{"idToken": "xyz"}"#).unwrap();
        assert_eq!(grant.token, "xyz");
    }
}
