//! Time abstractions
//!
//! Session expiry is compared against wall-clock epoch milliseconds, so the
//! clock abstraction is expressed in those units. Tests swap in [`MockClock`]
//! to move time without sleeping.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use clearhold_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::at(1_000);
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now_millis(), 6_000);
//! ```

pub mod clock;

pub use clock::{Clock, MockClock, SharedClock, SystemClock};
