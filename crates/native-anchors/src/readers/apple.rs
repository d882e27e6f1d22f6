//! macOS keychain trust settings, read through `security-framework`.

use security_framework::trust_settings::{Domain, TrustSettings, TrustSettingsForCertificate};
use tracing::{debug, warn};

use super::{RawStoreReader, StoreReadout};
use crate::error::StoreAccessError;
use crate::types::{PartialFailure, RawCertificateEntry, StoreId, TrustHint};

const STORE_FAMILY: &str = "macOS";

const DOMAINS: [(Domain, &str); 3] = [
    (Domain::User, "User"),
    (Domain::Admin, "Admin"),
    (Domain::System, "System"),
];

/// Reads the certificates carrying trust settings in the user, admin and
/// system domains.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeychainReader;

impl KeychainReader {
    pub const fn new() -> Self {
        Self
    }
}

impl RawStoreReader for KeychainReader {
    fn name(&self) -> &str {
        "keychain"
    }

    fn read_stores(&self) -> StoreReadout {
        let mut out = StoreReadout::default();
        for (domain, label) in DOMAINS {
            let store = StoreId::new(STORE_FAMILY, label);
            let settings = TrustSettings::new(domain);
            let certs = match settings.iter() {
                Ok(certs) => certs,
                Err(e) => {
                    warn!(store = %store, error = %e, "failed to enumerate trust settings");
                    out.failures.push(PartialFailure::store(
                        store,
                        StoreAccessError::NativeApi(format!("SecTrustSettingsCopyCertificates: {e}")),
                    ));
                    continue;
                }
            };

            let before = out.entries.len();
            for (position, cert) in certs.enumerate() {
                let entry = cert.subject_summary();
                let hint = match settings.tls_trust_settings_for_certificate(&cert) {
                    Ok(setting) => match hint_for(setting) {
                        Some(hint) => hint,
                        None => {
                            debug!(store = %store, entry = %entry, "no TLS trust setting, skipping");
                            continue;
                        }
                    },
                    Err(e) => {
                        out.failures.push(PartialFailure::entry(
                            store.clone(),
                            format!("#{position} {entry}"),
                            StoreAccessError::NativeApi(format!("SecTrustSettingsCopyTrustSettings: {e}")),
                        ));
                        continue;
                    }
                };
                out.entries.push(RawCertificateEntry::new(
                    cert.to_der(),
                    store.clone(),
                    hint,
                    entry,
                ));
            }
            debug!(store = %store, entries = out.entries.len() - before, "read trust settings domain");
        }
        out
    }
}

/// No TLS-specific setting means the certificate is trusted as a root.
/// `Unspecified` and `Invalid` settings do not make a TLS anchor, so those
/// certificates are not reported at all.
fn hint_for(setting: Option<TrustSettingsForCertificate>) -> Option<TrustHint> {
    match setting {
        None
        | Some(TrustSettingsForCertificate::TrustRoot | TrustSettingsForCertificate::TrustAsRoot) => {
            Some(TrustHint::ExplicitlyTrusted)
        }
        Some(TrustSettingsForCertificate::Deny) => Some(TrustHint::ExplicitlyDistrusted),
        Some(TrustSettingsForCertificate::Unspecified | TrustSettingsForCertificate::Invalid) => None,
    }
}
