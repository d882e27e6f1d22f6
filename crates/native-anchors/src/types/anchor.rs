//! Trust anchors and the discovery result handed back to callers.

use rustls_pki_types::CertificateDer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use super::cert::ParsedCertificate;
use super::store::StoreId;
use crate::error::FailureReason;
use crate::hash::Fingerprint;

/// A certificate trusted by at least one store and distrusted by none.
///
/// Equality and hashing consider only the fingerprint; `origin_stores`
/// records provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustAnchor {
    pub certificate: ParsedCertificate,
    pub origin_stores: BTreeSet<StoreId>,
}

impl TrustAnchor {
    /// The deduplication fingerprint (subject + public key).
    #[must_use]
    pub const fn fingerprint(&self) -> &Fingerprint {
        &self.certificate.fingerprint
    }

    /// Canonical DER encoding.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.certificate.der_bytes
    }
}

impl PartialEq for TrustAnchor {
    fn eq(&self, other: &Self) -> bool {
        self.certificate.fingerprint == other.certificate.fingerprint
    }
}

impl Eq for TrustAnchor {}

impl Hash for TrustAnchor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.certificate.fingerprint.hash(state);
    }
}

/// A non-fatal problem scoped to one store or one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFailure {
    pub store: StoreId,
    /// The entry inside the store, when the failure concerns one entry.
    pub entry: Option<String>,
    pub reason: FailureReason,
}

impl PartialFailure {
    /// A failure affecting a whole store.
    pub fn store(store: StoreId, reason: impl Into<FailureReason>) -> Self {
        Self {
            store,
            entry: None,
            reason: reason.into(),
        }
    }

    /// A failure affecting one entry of a store.
    pub fn entry(store: StoreId, entry: impl Into<String>, reason: impl Into<FailureReason>) -> Self {
        Self {
            store,
            entry: Some(entry.into()),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.entry {
            Some(entry) => write!(f, "{} [{}]: {}", self.store, entry, self.reason),
            None => write!(f, "{}: {}", self.store, self.reason),
        }
    }
}

/// The snapshot produced by one discovery pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Duplicate-free anchors, ordered by fingerprint.
    pub anchors: Vec<TrustAnchor>,
    /// Store- and entry-level failures that did not prevent a result.
    pub partial_failures: Vec<PartialFailure>,
}

impl DiscoveryResult {
    /// Number of anchors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether no anchors were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Fingerprints of all anchors.
    #[must_use]
    pub fn fingerprints(&self) -> BTreeSet<Fingerprint> {
        self.anchors.iter().map(|a| a.certificate.fingerprint).collect()
    }

    /// Whether an anchor with this fingerprint is present.
    #[must_use]
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.anchors
            .iter()
            .any(|a| &a.certificate.fingerprint == fingerprint)
    }

    /// Failures attributed to `store`.
    pub fn failures_for<'a>(&'a self, store: &'a StoreId) -> impl Iterator<Item = &'a PartialFailure> {
        self.partial_failures.iter().filter(move |f| &f.store == store)
    }

    /// The anchors as DER certificates, ready for a TLS root store.
    #[must_use]
    pub fn certificate_ders(&self) -> Vec<CertificateDer<'static>> {
        self.anchors
            .iter()
            .map(|a| CertificateDer::from(a.certificate.der_bytes.clone()))
            .collect()
    }

    /// All anchors as one PEM bundle.
    #[must_use]
    pub fn to_pem(&self) -> String {
        self.anchors.iter().map(|a| a.certificate.to_pem()).collect()
    }
}
