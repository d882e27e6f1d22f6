//! Raw store readers: one per native certificate store family.
//!
//! A reader only locates and copies certificate blobs; decoding and trust
//! decisions happen later in the pipeline. Readers never fail as a whole.
//! Whatever went wrong is reported in [`StoreReadout::failures`] next to
//! whatever could still be read.

pub mod directory;

#[cfg(target_os = "android")]
pub mod android;
#[cfg(target_os = "macos")]
pub mod apple;
#[cfg(windows)]
pub mod windows;

use std::fmt;

use crate::types::{PartialFailure, RawCertificateEntry};

pub use directory::{DirectoryReader, StoreSource};

#[cfg(target_os = "android")]
pub use android::AndroidReader;
#[cfg(target_os = "macos")]
pub use apple::KeychainReader;
#[cfg(windows)]
pub use windows::WindowsReader;

/// Everything one reader produced in one pass.
#[derive(Debug, Clone, Default)]
pub struct StoreReadout {
    pub entries: Vec<RawCertificateEntry>,
    pub failures: Vec<PartialFailure>,
}

impl StoreReadout {
    /// Whether the reader produced nothing and reported at least one failure.
    #[must_use]
    pub fn is_total_failure(&self) -> bool {
        self.entries.is_empty() && !self.failures.is_empty()
    }
}

/// Capability to enumerate one family of native trust stores.
pub trait RawStoreReader {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Stable description of what this reader looks at. Used as part of the
    /// cache key; readers whose sources are configurable must include them.
    fn descriptor(&self) -> String {
        self.name().to_string()
    }

    /// Enumerate every configured store.
    fn read_stores(&self) -> StoreReadout;
}

/// The backends the engine can drive.
pub enum Backend {
    /// PEM/DER files and OpenSSL-style certificate directories.
    Directory(DirectoryReader),
    /// The Windows system certificate stores.
    #[cfg(windows)]
    Windows(WindowsReader),
    /// macOS keychain trust settings.
    #[cfg(target_os = "macos")]
    Keychain(KeychainReader),
    /// The Android `AndroidCAStore` keystore.
    #[cfg(target_os = "android")]
    Android(AndroidReader),
    /// A caller-supplied reader.
    Custom(Box<dyn RawStoreReader + Send + Sync>),
}

impl Backend {
    /// Wrap a caller-supplied reader.
    pub fn custom(reader: impl RawStoreReader + Send + Sync + 'static) -> Self {
        Self::Custom(Box::new(reader))
    }

    fn reader(&self) -> &dyn RawStoreReader {
        match self {
            Self::Directory(r) => r,
            #[cfg(windows)]
            Self::Windows(r) => r,
            #[cfg(target_os = "macos")]
            Self::Keychain(r) => r,
            #[cfg(target_os = "android")]
            Self::Android(r) => r,
            Self::Custom(r) => r.as_ref(),
        }
    }
}

impl RawStoreReader for Backend {
    fn name(&self) -> &str {
        self.reader().name()
    }

    fn descriptor(&self) -> String {
        self.reader().descriptor()
    }

    fn read_stores(&self) -> StoreReadout {
        self.reader().read_stores()
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(r) => f.debug_tuple("Directory").field(r).finish(),
            #[cfg(windows)]
            Self::Windows(r) => f.debug_tuple("Windows").field(r).finish(),
            #[cfg(target_os = "macos")]
            Self::Keychain(r) => f.debug_tuple("Keychain").field(r).finish(),
            #[cfg(target_os = "android")]
            Self::Android(r) => f.debug_tuple("Android").field(r).finish(),
            Self::Custom(r) => f.debug_tuple("Custom").field(&r.name()).finish(),
        }
    }
}
