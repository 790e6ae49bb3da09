//! Domain types and models

pub mod auth;
pub mod request;
pub mod user;

pub use auth::{AuthGrant, Credential, MagicLinkCallback, SessionSnapshot, SignInSource};
pub use request::{ApiResponse, HttpMethod, QueuedRequest, RequestConfig};
pub use user::{KycStatus, ProfileUpdate, UserProfile, WalletAddress};
