//! Core type definitions using newtype patterns for type safety.
//!
//! These types make invalid targets and ports unrepresentable once parsed.

mod credentials;
mod port;
mod target;

pub use credentials::Credentials;
pub use port::{Port, PortError};
pub use target::{AddressRange, TargetError};
