//! Core types for trust anchor discovery.

pub mod anchor;
pub mod cert;
pub mod store;

pub use anchor::{DiscoveryResult, PartialFailure, TrustAnchor};
pub use cert::{DistinguishedName, ParsedCertificate};
pub use store::{RawCertificateEntry, StoreId, TrustHint};

/// Serde adapter rendering byte vectors as standard base64 strings.
pub(crate) mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
