//! Trust filter: decides whether one parsed entry qualifies as an anchor.
//!
//! Distrust is store-set-wide and therefore enforced again when stores are
//! merged (see [`crate::dedup`]); here a distrusting entry is simply never
//! accepted itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::{ParsedCertificate, StoreId, TrustHint};

/// Whether certificates outside their validity window are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityPolicy {
    /// Keep everything the store lists; leave validity to the chain validator.
    #[default]
    IncludeAll,
    /// Drop certificates that are expired or not yet valid.
    CurrentOnly,
}

/// Why an entry was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The store marks the certificate as distrusted.
    Distrusted,
    /// Neither self-signed nor a CA: leaf or intermediate material.
    NotAnAnchor,
    /// Outside the validity window under [`ValidityPolicy::CurrentOnly`].
    OutsideValidity,
}

/// Outcome of [`TrustFilter::assess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

/// Per-entry anchor policy.
#[derive(Debug, Clone, Copy)]
pub struct TrustFilter {
    validity: ValidityPolicy,
    now: DateTime<Utc>,
}

impl TrustFilter {
    /// A filter evaluating validity against the current time.
    #[must_use]
    pub fn new(validity: ValidityPolicy) -> Self {
        Self::at(validity, Utc::now())
    }

    /// A filter evaluating validity against a fixed instant.
    #[must_use]
    pub const fn at(validity: ValidityPolicy, now: DateTime<Utc>) -> Self {
        Self { validity, now }
    }

    /// Whether `cert`, as presented by `store` with `hint`, is an anchor.
    pub fn is_anchor(&self, cert: &ParsedCertificate, hint: TrustHint, store: &StoreId) -> bool {
        let verdict = self.assess(cert, hint);
        if let Verdict::Reject(reason) = verdict {
            trace!(
                store = %store,
                subject = %cert.subject,
                ?reason,
                "entry rejected"
            );
        }
        verdict == Verdict::Accept
    }

    /// Apply the policy, in priority order.
    #[must_use]
    pub fn assess(&self, cert: &ParsedCertificate, hint: TrustHint) -> Verdict {
        if hint == TrustHint::ExplicitlyDistrusted {
            return Verdict::Reject(RejectReason::Distrusted);
        }
        if !cert.is_self_signed && !cert.is_ca {
            return Verdict::Reject(RejectReason::NotAnAnchor);
        }
        if self.validity == ValidityPolicy::CurrentOnly && !cert.is_valid_at(self.now) {
            return Verdict::Reject(RejectReason::OutsideValidity);
        }
        Verdict::Accept
    }
}

impl Default for TrustFilter {
    fn default() -> Self {
        Self::new(ValidityPolicy::default())
    }
}
