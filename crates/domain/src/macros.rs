//! Macro for implementing Display and FromStr for wire-level enums
//!
//! Backend payloads carry enums as strings (`"GET"`, `"approved"`). This macro
//! generates a single mapping for both directions: Display writes the string
//! exactly as given, FromStr accepts it in any letter case.
//!
//! # Example
//!
//! ```rust
//! use clearhold_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ReviewState {
//!     Open,
//!     Closed,
//! }
//!
//! impl_domain_enum_conversions!(ReviewState {
//!     Open => "open",
//!     Closed => "closed",
//! });
//!
//! assert_eq!(ReviewState::Open.to_string(), "open");
//! assert_eq!("CLOSED".parse::<ReviewState>(), Ok(ReviewState::Closed));
//! ```

/// Implements Display and FromStr traits for wire-level enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire representation of this variant
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
