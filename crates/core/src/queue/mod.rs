//! Offline queue and replay

pub mod offline;
pub mod replay;

pub use offline::OfflineQueue;
pub use replay::{replay, ReplayDisposition, ReplayPolicy, ReplayReport, ReplayTarget};
