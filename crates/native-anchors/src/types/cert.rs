//! Parsed certificate information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::Fingerprint;

/// An X.501 name, kept both as printable text and as its DER encoding.
///
/// Equality compares the DER; the text is for humans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistinguishedName {
    /// RFC 4514 rendering, e.g. `CN=Example Root, O=Example, C=US`.
    pub text: String,
    /// DER encoding of the `Name` SEQUENCE.
    #[serde(with = "super::b64")]
    pub der: Vec<u8>,
}

impl DistinguishedName {
    /// The first `CN=` attribute, if any.
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.text.split(',').find_map(|part| {
            part.trim()
                .strip_prefix("CN=")
                .map(str::trim)
        })
    }
}

impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for DistinguishedName {}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A certificate decoded from a store entry and normalized to DER.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCertificate {
    /// Canonical DER encoding.
    #[serde(with = "super::b64")]
    pub der_bytes: Vec<u8>,
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    /// Serial number (hex, as encoded)
    pub serial: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// DER encoding of the SubjectPublicKeyInfo.
    #[serde(with = "super::b64")]
    pub spki: Vec<u8>,
    /// SHA-256 of `spki`.
    pub public_key_fingerprint: Fingerprint,
    /// Deduplication key: SHA-256 of subject DER followed by SPKI DER.
    pub fingerprint: Fingerprint,
    /// SHA-256 of `der_bytes`, the conventional certificate fingerprint.
    pub certificate_sha256: Fingerprint,
    pub is_self_signed: bool,
    pub is_ca: bool,
}

impl ParsedCertificate {
    /// Whether `at` falls inside the validity window (inclusive).
    #[must_use]
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    /// Whether the certificate has expired at `at`.
    #[must_use]
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at > self.not_after
    }

    /// Subject CN, falling back to the whole subject.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.subject.common_name().unwrap_or(&self.subject.text)
    }

    /// PEM armor for the canonical DER.
    #[must_use]
    pub fn to_pem(&self) -> String {
        crate::parser::der_to_pem(&self.der_bytes)
    }
}
