//! Synchronization primitives shared by the pipeline and the session

pub mod connectivity;

pub use connectivity::ConnectivityFlag;
