//! Session lifecycle: sign-in, renewal, sign-out and profile cache

pub mod magic_link;
pub mod ports;
pub mod session;
pub mod token_store;

pub use magic_link::{is_sign_in_link, parse_callback};
pub use ports::{AccessTokenProvider, AuthBackend};
pub use session::{SessionManager, SessionOptions};
pub use token_store::TokenStore;
