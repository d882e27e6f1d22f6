//! Loading discovered anchors into a rustls root store.

use rustls::RootCertStore;
use tracing::{debug, warn};

use crate::config::DiscoveryConfig;
use crate::error::Result;
use crate::types::DiscoveryResult;

impl DiscoveryResult {
    /// Build a [`RootCertStore`] from the anchors.
    ///
    /// Returns the store and the number of anchors rustls could not use.
    #[must_use]
    pub fn to_root_store(&self) -> (RootCertStore, usize) {
        let mut store = RootCertStore::empty();
        let (added, ignored) = store.add_parsable_certificates(self.certificate_ders());
        if ignored > 0 {
            warn!(added, ignored, "some trust anchors were not accepted by rustls");
        } else {
            debug!(added, "loaded trust anchors into rustls root store");
        }
        (store, ignored)
    }
}

/// Discover the platform anchors and load them into a [`RootCertStore`].
pub fn root_store(config: &DiscoveryConfig) -> Result<(RootCertStore, DiscoveryResult)> {
    let result = crate::discover(config)?;
    let (store, _) = result.to_root_store();
    Ok((store, result))
}
