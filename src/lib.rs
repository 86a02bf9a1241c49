//! # sshsweep - SSH credential sweeping across address ranges
//!
//! sshsweep takes an address range, tries a single username/password pair
//! over SSH against every address in it, and reports which hosts accepted
//! the login.
//!
//! ## Features
//!
//! - **Flexible Targeting**: single IPs, CIDR ranges, and the `N` shorthand
//!   for `192.168.N.0/24`
//! - **Bounded Concurrency**: a fixed pool of in-flight attempts fed from a
//!   lazy, bounded address stream, so a /8 costs no more memory than a /30
//! - **Live Progress**: a refreshed progress line and immediate hit lines
//! - **Result File**: successful addresses written one per line as found
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use sshsweep::scanner::{ScanConfig, ScanJob, SshProber};
//! use sshsweep::types::{AddressRange, Credentials};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let range = AddressRange::parse("192.168.1.0/24").unwrap();
//!     let prober = SshProber::new(Credentials::new("root", "toor"), Duration::from_secs(3));
//!     let config = ScanConfig::default().with_concurrency(200);
//!
//!     let summary = ScanJob::new(config, Arc::new(prober)).run(&range).await.unwrap();
//!     println!("{} of {} accepted", summary.succeeded, summary.attempted);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Address ranges, ports, and credentials
//! - [`scanner`] - Enumeration, the `Prober` trait, and the scan coordinator
//! - [`storage`] - The result sink and its output file
//! - [`config`] - Settings file with default option values
//! - [`output`] - Terminal rendering
//! - [`cli`] - Command-line definitions
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ProbeFailure, ScanError};
pub use scanner::{Prober, ScanConfig, ScanJob, ScanSummary, SshProber};
pub use types::{AddressRange, Credentials, Port};
