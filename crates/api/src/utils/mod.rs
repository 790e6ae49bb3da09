//! Shared helpers for commands and start-up

pub mod command_helpers;
pub mod health;
pub mod logging;
