//! Scan result persistence.
//!
//! The only durable artifact is a flat file of addresses that accepted the
//! credentials, one per line, in the order they were found.

mod sink;

pub use sink::ResultSink;
