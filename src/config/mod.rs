//! Configuration management for sshsweep.
//!
//! Provides an XDG-compliant settings file whose values become the defaults
//! for command-line options.

mod settings;

pub use settings::{AppSettings, Paths};
