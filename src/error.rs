//! Error types for sshsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Only run-level errors
//! ever reach the caller; per-address [`ProbeFailure`]s are absorbed into the
//! scan tally.

use crate::types::TargetError;
use std::path::PathBuf;
use thiserror::Error;

/// Run-level errors that abort a scan before it starts.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to create output file {}: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Classified reason a single probe did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("authentication rejected")]
    AuthRejected,

    #[error("timed out")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

impl ProbeFailure {
    /// Class of this failure, without its detail.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unreachable(_) => FailureKind::Unreachable,
            Self::AuthRejected => FailureKind::AuthRejected,
            Self::Timeout => FailureKind::Timeout,
            Self::Other(_) => FailureKind::Other,
        }
    }
}

/// Failure classes without their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Unreachable,
    AuthRejected,
    Timeout,
    Other,
}

impl FailureKind {
    pub const ALL: [FailureKind; 4] = [
        FailureKind::Unreachable,
        FailureKind::AuthRejected,
        FailureKind::Timeout,
        FailureKind::Other,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Unreachable => 0,
            Self::AuthRejected => 1,
            Self::Timeout => 2,
            Self::Other => 3,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable => write!(f, "unreachable"),
            Self::AuthRejected => write!(f, "auth rejected"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Errors from loading or saving settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {}: {reason}", path.display())]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {}: {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level error for the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind() {
        assert_eq!(
            ProbeFailure::Unreachable("refused".into()).kind(),
            FailureKind::Unreachable
        );
        assert_eq!(ProbeFailure::AuthRejected.kind(), FailureKind::AuthRejected);
        assert_eq!(ProbeFailure::Timeout.to_string(), "timed out");

        let indices: Vec<usize> = FailureKind::ALL.iter().map(|k| k.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_resource_unavailable_message() {
        let err = ScanError::ResourceUnavailable {
            path: PathBuf::from("/nope/hits.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nope/hits.txt"));
    }
}
