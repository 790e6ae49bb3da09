//! Port interfaces for authentication
//!
//! These traits define the boundary between session logic and the transport
//! that talks to the identity backend.

use async_trait::async_trait;
use clearhold_domain::{AuthGrant, ProfileUpdate, Result, SignInSource, UserProfile};

/// Identity backend operations
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange a sign-in source for a grant
    async fn sign_in(&self, source: &SignInSource) -> Result<AuthGrant>;

    /// Renew the session identified by `access_token`
    async fn refresh(&self, access_token: &str) -> Result<AuthGrant>;

    /// Invalidate the session server-side
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Ask the backend to email a one-time sign-in link
    async fn send_magic_link(&self, email: &str) -> Result<()>;

    /// Fetch the signed-in user's profile
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile>;

    /// Apply a partial update and return the stored profile
    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile>;
}

/// Source of the bearer token attached to outgoing requests
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Current access token, renewing it first when it is about to expire;
    /// `None` when signed out
    async fn access_token(&self) -> Result<Option<String>>;
}
