//! Session commands: sign-in, magic links, sign-out and the profile cache

use clearhold_core::auth::is_sign_in_link;
use clearhold_domain::{ProfileUpdate, SessionSnapshot, SignInSource, UserProfile};

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Sign in with email and password.
pub async fn sign_in_with_email(
    ctx: &AppContext,
    email: String,
    password: String,
) -> Result<SessionSnapshot, String> {
    execute_command("auth::sign_in_with_email", || async {
        ctx.session.sign_in(SignInSource::EmailPassword { email, password }).await
    })
    .await
}

/// Exchange an identity token from an external provider for a session.
pub async fn sign_in_with_id_token(
    ctx: &AppContext,
    id_token: String,
) -> Result<SessionSnapshot, String> {
    execute_command("auth::sign_in_with_id_token", || async {
        ctx.session.sign_in(SignInSource::IdToken { id_token }).await
    })
    .await
}

/// Email a one-time sign-in link.
pub async fn send_magic_link(ctx: &AppContext, email: String) -> Result<(), String> {
    execute_command("auth::send_magic_link", || async {
        ctx.session.send_magic_link(&email).await
    })
    .await
}

/// Finish a passwordless sign-in from the callback URL the app was opened
/// with. `email` is only needed when the link is opened on another device.
pub async fn complete_magic_link(
    ctx: &AppContext,
    link: String,
    email: Option<String>,
) -> Result<SessionSnapshot, String> {
    execute_command("auth::complete_magic_link", || async {
        ctx.session.complete_magic_link(&link, email.as_deref()).await
    })
    .await
}

/// Whether `link` is a passwordless sign-in callback.
pub fn is_magic_link(link: &str) -> bool {
    is_sign_in_link(link)
}

/// End the session locally and on the backend.
pub async fn sign_out(ctx: &AppContext) -> Result<(), String> {
    execute_command("auth::sign_out", || async { ctx.session.sign_out().await }).await
}

/// Current session state, without touching the network.
pub async fn get_session(ctx: &AppContext) -> Result<SessionSnapshot, String> {
    Ok(ctx.session.snapshot())
}

/// Renew the access token now.
pub async fn refresh_session(ctx: &AppContext) -> Result<SessionSnapshot, String> {
    execute_command("auth::refresh_session", || async {
        ctx.session.refresh().await?;
        Ok(ctx.session.snapshot())
    })
    .await
}

/// Cached user profile.
pub async fn get_user_profile(ctx: &AppContext) -> Result<Option<UserProfile>, String> {
    Ok(ctx.session.profile())
}

/// Re-fetch the user profile from the backend.
pub async fn refresh_user_profile(ctx: &AppContext) -> Result<UserProfile, String> {
    execute_command("auth::refresh_user_profile", || async { ctx.session.refresh_profile().await })
        .await
}

/// Apply a partial profile update.
pub async fn update_user_profile(
    ctx: &AppContext,
    update: ProfileUpdate,
) -> Result<UserProfile, String> {
    execute_command("auth::update_user_profile", || async {
        ctx.session.update_profile(update).await
    })
    .await
}
