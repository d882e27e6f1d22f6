//! Merging anchors from several stores into one duplicate-free set.
//!
//! Entries are grouped by [`ParsedCertificate::fingerprint`] (subject and
//! public key), so a root re-issued with a new validity period collapses
//! into one anchor. Distrust is collected over the whole input before any
//! group is admitted.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::hash::Fingerprint;
use crate::types::{DiscoveryResult, ParsedCertificate, StoreId, TrustAnchor, TrustHint};

/// Merge filtered entries into a [`DiscoveryResult`] with no failures.
///
/// Output is sorted by fingerprint and does not depend on input order.
pub fn merge<I>(entries: I) -> DiscoveryResult
where
    I: IntoIterator<Item = (ParsedCertificate, StoreId, TrustHint)>,
{
    let entries: Vec<_> = entries.into_iter().collect();

    // Pass 1: distrust anywhere wins everywhere.
    let distrusted: HashSet<Fingerprint> = entries
        .iter()
        .filter(|(_, _, hint)| *hint == TrustHint::ExplicitlyDistrusted)
        .map(|(cert, _, _)| cert.fingerprint)
        .collect();

    // Pass 2: group the rest.
    let mut groups: BTreeMap<Fingerprint, TrustAnchor> = BTreeMap::new();
    let mut suppressed = 0usize;
    for (cert, store, hint) in entries {
        if hint == TrustHint::ExplicitlyDistrusted {
            continue;
        }
        if distrusted.contains(&cert.fingerprint) {
            debug!(
                store = %store,
                subject = %cert.subject,
                "certificate distrusted by another store"
            );
            suppressed += 1;
            continue;
        }

        match groups.get_mut(&cert.fingerprint) {
            Some(anchor) => {
                anchor.origin_stores.insert(store);
                if prefer(&cert, &anchor.certificate) {
                    anchor.certificate = cert;
                }
            }
            None => {
                groups.insert(
                    cert.fingerprint,
                    TrustAnchor {
                        certificate: cert,
                        origin_stores: BTreeSet::from([store]),
                    },
                );
            }
        }
    }

    debug!(
        anchors = groups.len(),
        distrusted = distrusted.len(),
        suppressed,
        "merged store entries"
    );

    DiscoveryResult {
        anchors: groups.into_values().collect(),
        partial_failures: Vec::new(),
    }
}

/// Representative choice within a group: latest expiry, then smaller DER.
fn prefer(candidate: &ParsedCertificate, current: &ParsedCertificate) -> bool {
    candidate
        .not_after
        .cmp(&current.not_after)
        .then_with(|| current.der_bytes.cmp(&candidate.der_bytes))
        .is_gt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn store(name: &str) -> StoreId {
        StoreId::new("Test", name)
    }

    #[test]
    fn duplicates_collapse_and_union_provenance() {
        let root = testutil::root("Shared Root").parsed();
        let result = merge(vec![
            (root.clone(), store("a"), TrustHint::Unspecified),
            (root.clone(), store("b"), TrustHint::ExplicitlyTrusted),
            (root, store("a"), TrustHint::Unspecified),
        ]);

        assert_eq!(result.len(), 1);
        let origins: Vec<_> = result.anchors[0].origin_stores.iter().cloned().collect();
        assert_eq!(origins, vec![store("a"), store("b")]);
        assert!(result.partial_failures.is_empty());
    }

    #[test]
    fn distrust_in_one_store_removes_from_all() {
        let bad = testutil::root("Compromised Root").parsed();
        let good = testutil::root("Good Root").parsed();
        let result = merge(vec![
            (bad.clone(), store("user"), TrustHint::ExplicitlyTrusted),
            (good.clone(), store("user"), TrustHint::Unspecified),
            (bad.clone(), store("disallowed"), TrustHint::ExplicitlyDistrusted),
        ]);

        assert_eq!(result.len(), 1);
        assert!(result.contains(&good.fingerprint));
        assert!(!result.contains(&bad.fingerprint));
    }

    #[test]
    fn distrust_applies_to_reissued_certificates() {
        let original = testutil::root("Rotated Root");
        let reissued = testutil::reissue(&original, 7);
        let result = merge(vec![
            (reissued.parsed(), store("system"), TrustHint::Unspecified),
            (original.parsed(), store("blocklist"), TrustHint::ExplicitlyDistrusted),
        ]);
        assert!(result.is_empty());
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let a = testutil::root("Order A").parsed();
        let b = testutil::root("Order B").parsed();
        let c = testutil::root("Order C").parsed();
        let forward = merge(vec![
            (a.clone(), store("x"), TrustHint::Unspecified),
            (b.clone(), store("y"), TrustHint::Unspecified),
            (c.clone(), store("z"), TrustHint::Unspecified),
        ]);
        let backward = merge(vec![
            (c, store("z"), TrustHint::Unspecified),
            (b, store("y"), TrustHint::Unspecified),
            (a, store("x"), TrustHint::Unspecified),
        ]);

        let fps = |r: &DiscoveryResult| r.anchors.iter().map(|a| *a.fingerprint()).collect::<Vec<_>>();
        assert_eq!(fps(&forward), fps(&backward));
        let mut sorted = fps(&forward);
        sorted.sort();
        assert_eq!(fps(&forward), sorted);
    }

    #[test]
    fn representative_choice_is_deterministic() {
        let root = testutil::root("Twice Root");
        let again = testutil::reissue(&root, 42);
        let (p, q) = (root.parsed(), again.parsed());

        let one = merge(vec![
            (p.clone(), store("a"), TrustHint::Unspecified),
            (q.clone(), store("b"), TrustHint::Unspecified),
        ]);
        let two = merge(vec![
            (q, store("b"), TrustHint::Unspecified),
            (p, store("a"), TrustHint::Unspecified),
        ]);

        assert_eq!(one.len(), 1);
        assert_eq!(one.anchors[0].der(), two.anchors[0].der());
        assert_eq!(one.anchors[0].origin_stores.len(), 2);
    }
}
