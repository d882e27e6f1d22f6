//! Error types for trust anchor discovery.
//!
//! Two tiers: [`DiscoveryError`] aborts a discovery call, while
//! [`StoreAccessError`] and [`ParseError`] are recorded as
//! [`PartialFailure`](crate::PartialFailure)s next to a still-usable result.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::types::PartialFailure;

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Fatal errors: no usable result can be returned.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Caller-supplied configuration is invalid. Reported before any store is opened.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every configured backend failed and none produced a single entry.
    #[error("no trust store available ({} failure(s))", failures.len())]
    NoStoreAvailable {
        /// The failures reported by each backend.
        failures: Vec<PartialFailure>,
    },

    /// Discovery did not finish within the caller's deadline.
    #[error("discovery timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking discovery task panicked or was cancelled.
    #[error("discovery task failed: {0}")]
    Join(String),

    /// Reading a configuration file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid TOML.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DiscoveryError {
    /// Build a configuration error from anything printable.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns true if this is the total-unavailability error.
    #[must_use]
    pub const fn is_no_store_available(&self) -> bool {
        matches!(self, Self::NoStoreAvailable { .. })
    }
}

/// A store could not be opened or enumerated.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StoreAccessError {
    /// The process lacks permission to read the store.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The store does not exist but was required.
    #[error("store absent: {0}")]
    StoreAbsent(String),

    /// A platform API call failed.
    #[error("native api failure: {0}")]
    NativeApi(String),

    /// Any other read failure.
    #[error("read failed: {0}")]
    Read(String),
}

impl StoreAccessError {
    /// Classify an I/O error against the path or handle it concerned.
    pub fn io(context: impl std::fmt::Display, err: &std::io::Error) -> Self {
        let detail = format!("{context}: {err}");
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(detail),
            std::io::ErrorKind::NotFound => Self::StoreAbsent(detail),
            _ => Self::Read(detail),
        }
    }
}

/// A single store entry could not be decoded into a certificate.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ParseError {
    /// The encoding ends before the certificate does.
    #[error("certificate data is truncated")]
    Truncated,

    /// Neither DER nor a certificate PEM block.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Well-framed data that is not a valid X.509 certificate.
    #[error("structurally invalid certificate: {0}")]
    StructurallyInvalid(String),
}

/// Why a store or entry contributed nothing to the result.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The store (or a file inside it) could not be read.
    #[error(transparent)]
    Access(#[from] StoreAccessError),

    /// An entry was read but could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            StoreAccessError::io("/etc/ssl/certs", &denied),
            StoreAccessError::PermissionDenied(_)
        ));

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            StoreAccessError::io("/nope", &missing),
            StoreAccessError::StoreAbsent(_)
        ));

        let other = std::io::Error::from(std::io::ErrorKind::InvalidData);
        let err = StoreAccessError::io("/x", &other);
        assert!(matches!(err, StoreAccessError::Read(_)));
        assert!(err.to_string().contains("/x"));
    }

    #[test]
    fn failure_reason_serializes_with_kind() {
        let reason = FailureReason::Parse(ParseError::Truncated);
        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("truncated"));

        let back: FailureReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reason);
    }

    #[test]
    fn no_store_available_counts_failures() {
        let err = DiscoveryError::NoStoreAvailable { failures: vec![] };
        assert!(err.is_no_store_available());
        assert_eq!(err.to_string(), "no trust store available (0 failure(s))");
    }
}
