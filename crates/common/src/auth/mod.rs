//! Authentication helpers shared by the session layer
//!
//! Pure functions only: decoding access-token claims for expiry scheduling.
//! Storage and refresh orchestration live in `clearhold-core`.

pub mod claims;

pub use claims::{decode_claims, expiry_or_default, ClaimsError, TokenClaims};
