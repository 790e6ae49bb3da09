//! Client constants
//!
//! Centralized location for the fixed storage keys, timing defaults and
//! backend paths used throughout the client.

// Durable store keys
pub const STORAGE_KEY_ACCESS_TOKEN: &str = "clearhold_auth_token";
pub const STORAGE_KEY_TOKEN_EXPIRY: &str = "clearhold_token_expiry";
pub const STORAGE_KEY_SUBJECT_ID: &str = "clearhold_subject_id";
pub const STORAGE_KEY_USER_PROFILE: &str = "clearhold_user_profile";
pub const STORAGE_KEY_EMAIL_FOR_SIGN_IN: &str = "emailForSignIn";
pub const STORAGE_KEY_OFFLINE_QUEUE: &str = "clearhold_offline_queue";

// Session timing
pub const REFRESH_BUFFER_MS: i64 = 5 * 60 * 1000;
pub const DEFAULT_TOKEN_LIFETIME_MS: i64 = 60 * 60 * 1000;

// Request pipeline defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 2_000;
pub const DEFAULT_MAX_LOG_ENTRIES: usize = 500;
pub const DEFAULT_MAX_REPLAY_ATTEMPTS: u32 = 3;

/// Message returned for mutating calls deferred while offline
pub const QUEUED_MESSAGE: &str = "Request queued for when connection is restored";

// Magic-link callback shape
pub const MAGIC_LINK_MODE: &str = "signIn";

// Backend auth endpoints
pub const AUTH_SIGN_IN_PATH: &str = "/auth/signin";
pub const AUTH_SIGN_IN_TOKEN_PATH: &str = "/auth/signin/token";
pub const AUTH_MAGIC_LINK_SEND_PATH: &str = "/auth/magic-link/send";
pub const AUTH_MAGIC_LINK_VERIFY_PATH: &str = "/auth/magic-link/verify";
pub const AUTH_REFRESH_PATH: &str = "/auth/refresh-token";
pub const AUTH_SIGN_OUT_PATH: &str = "/auth/logout";
pub const AUTH_PROFILE_PATH: &str = "/auth/profile";
pub const HEALTH_PATH: &str = "/health";
