//! # native-anchors
//!
//! Discovers the root certificates the host operating system trusts and
//! hands them to a TLS stack as one canonical, duplicate-free anchor set.
//!
//! The answer is the one the OS itself would give: entries a store marks as
//! distrusted are removed everywhere, leaf and intermediate material listed
//! by mistake is dropped, and a store that cannot be read degrades the
//! result instead of failing it.
//!
//! ## Backends
//!
//! - **Linux / BSD / other Unix**: bundle files and hashed certificate
//!   directories (`openssl-probe` locations plus well-known paths)
//! - **Windows**: `ROOT` and `Disallowed` in every system store location
//!   (user, machine, enterprise, group policy, service) via the CryptoAPI
//! - **macOS**: keychain trust settings via `security-framework`
//! - **Android**: the `AndroidCAStore` keystore over JNI
//! - **iOS**: configured paths only
//!
//! `SSL_CERT_FILE` and `SSL_CERT_DIR` replace the platform stores when set.
//!
//! ## Data Flow
//!
//! ```text
//! Platform + DiscoveryConfig
//!   -> select_backends()            one Backend per store family
//!   -> RawStoreReader::read_stores  RawCertificateEntry + PartialFailure
//!   -> parser::parse()              ParsedCertificate (canonical DER)
//!   -> TrustFilter::is_anchor()     distrust / CA / validity policy
//!   -> dedup::merge()               TrustAnchor set keyed by subject+SPKI
//!   -> DiscoveryResult
//! ```
//!
//! ## Features
//!
//! - `rustls`: [`DiscoveryResult::to_root_store`] and [`tls::root_store`]
//! - `tokio`: [`runtime::discover_with_timeout`]
//! - `webpki`: [`DiscoveryResult::to_trust_anchors`] and [`pki::trust_anchors`]

pub mod cache;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hash;
pub mod parser;
pub mod platform;
pub mod readers;
#[cfg(feature = "tokio")]
pub mod runtime;
#[cfg(feature = "rustls")]
pub mod tls;
pub mod types;
#[cfg(feature = "webpki")]
pub mod pki;

#[cfg(test)]
mod testutil;

pub use cache::{discover_cached, invalidate_all};
pub use config::DiscoveryConfig;
pub use engine::DiscoveryEngine;
pub use error::{DiscoveryError, FailureReason, ParseError, Result, StoreAccessError};
pub use filter::{TrustFilter, ValidityPolicy};
pub use hash::Fingerprint;
pub use platform::{EnvOverrides, Platform};
pub use readers::{Backend, RawStoreReader, StoreReadout};
pub use types::*;

/// Discover the trust anchors of the running platform.
///
/// # Errors
///
/// [`DiscoveryError::Configuration`] if `config` is invalid, or
/// [`DiscoveryError::NoStoreAvailable`] if no store could be read at all.
pub fn discover(config: &DiscoveryConfig) -> Result<DiscoveryResult> {
    DiscoveryEngine::new(config)?.discover()
}
