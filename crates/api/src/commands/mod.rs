//! Commands - the surface a UI shell calls into
//!
//! Every command takes the shared [`crate::AppContext`] and returns
//! `Result<T, String>` with a user-facing error message.

mod auth;
mod health;
mod requests;

pub use auth::*;
pub use health::*;
pub use requests::*;
