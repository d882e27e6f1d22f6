//! Store identity and raw entries as produced by readers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Names a native store, as `"<Family>:<name>"`.
///
/// Examples: `Windows:CurrentUser/ROOT`, `macOS:System`,
/// `Android:AndroidCAStore/system`, `Unix:/etc/ssl/certs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    /// Build an identifier from a platform family and a store name.
    pub fn new(family: &str, name: impl fmt::Display) -> Self {
        Self(format!("{family}:{name}"))
    }

    /// The full identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `:`.
    #[must_use]
    pub fn family(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(f, _)| f)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trust information a store attaches to an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustHint {
    /// The store lists the certificate without saying anything more.
    #[default]
    Unspecified,
    /// The store marks the certificate as a trusted root.
    ExplicitlyTrusted,
    /// The store marks the certificate as distrusted.
    ExplicitlyDistrusted,
}

/// An undecoded certificate blob, straight out of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCertificateEntry {
    /// DER or PEM bytes.
    pub bytes: Vec<u8>,
    /// The store this entry came from.
    pub source: StoreId,
    /// Store-supplied trust flag.
    pub trust_hint: TrustHint,
    /// Where inside the store: file path, keystore alias, or position.
    pub label: String,
}

impl RawCertificateEntry {
    pub fn new(
        bytes: Vec<u8>,
        source: StoreId,
        trust_hint: TrustHint,
        label: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            source,
            trust_hint,
            label: label.into(),
        }
    }
}
