//! Terminal output.
//!
//! Plain-text banner and summary, plus an `indicatif`-backed reporter that
//! keeps a single refreshed progress line and prints each hit above it.

mod plain;
mod progress;

pub use plain::{print_error, print_scan_header, print_summary, print_warning};
pub use progress::TerminalReporter;
