//! Converting discovered anchors into `webpki` trust anchors.

use rustls_pki_types::{CertificateDer, TrustAnchor as WebpkiAnchor};
use tracing::{debug, warn};

use crate::config::DiscoveryConfig;
use crate::error::{ParseError, Result};
use crate::types::{DiscoveryResult, PartialFailure, StoreId};

impl DiscoveryResult {
    /// Convert every anchor into an owned [`WebpkiAnchor`] (subject, SPKI and
    /// name constraints).
    ///
    /// Anchors webpki cannot decode come back as partial failures against
    /// the first store that listed them.
    #[must_use]
    pub fn to_trust_anchors(&self) -> (Vec<WebpkiAnchor<'static>>, Vec<PartialFailure>) {
        let mut anchors = Vec::with_capacity(self.anchors.len());
        let mut failures = Vec::new();

        for anchor in &self.anchors {
            let der = CertificateDer::from(anchor.der());
            match webpki::anchor_from_trusted_cert(&der) {
                Ok(trust_anchor) => anchors.push(trust_anchor.to_owned()),
                Err(e) => {
                    let store = anchor
                        .origin_stores
                        .iter()
                        .next()
                        .cloned()
                        .unwrap_or_else(|| StoreId::new("Anchor", "unknown"));
                    warn!(store = %store, fingerprint = %anchor.fingerprint(), error = ?e, "webpki rejected anchor");
                    failures.push(PartialFailure::entry(
                        store,
                        anchor.certificate.display_name().to_string(),
                        ParseError::StructurallyInvalid(format!("webpki: {e:?}")),
                    ));
                }
            }
        }

        debug!(anchors = anchors.len(), rejected = failures.len(), "converted to webpki trust anchors");
        (anchors, failures)
    }
}

/// Discover the platform anchors and convert them for webpki.
pub fn trust_anchors(config: &DiscoveryConfig) -> Result<(Vec<WebpkiAnchor<'static>>, DiscoveryResult)> {
    let mut result = crate::discover(config)?;
    let (anchors, failures) = result.to_trust_anchors();
    result.partial_failures.extend(failures);
    Ok((anchors, result))
}
