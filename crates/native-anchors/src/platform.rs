//! Platform identity and default backend selection.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::readers::{Backend, DirectoryReader, RawStoreReader, StoreSource};

#[cfg(target_os = "android")]
use crate::readers::AndroidReader;
#[cfg(target_os = "macos")]
use crate::readers::KeychainReader;
#[cfg(windows)]
use crate::readers::WindowsReader;

/// The operating system family discovery runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Linux,
    Bsd,
    MacOs,
    Ios,
    Windows,
    Android,
    /// Any other Unix; treated like Linux.
    OtherUnix,
    Unsupported,
}

impl Platform {
    /// The platform this binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else if cfg!(windows) {
            Self::Windows
        } else if cfg!(any(
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            Self::Bsd
        } else if cfg!(unix) {
            Self::OtherUnix
        } else {
            Self::Unsupported
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Bsd => "bsd",
            Self::MacOs => "macos",
            Self::Ios => "ios",
            Self::Windows => "windows",
            Self::Android => "android",
            Self::OtherUnix => "unix",
            Self::Unsupported => "unsupported",
        }
    }

    /// Platforms whose trust store is a set of files and directories.
    #[must_use]
    pub const fn uses_directory_store(self) -> bool {
        matches!(self, Self::Linux | Self::Bsd | Self::OtherUnix)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `SSL_CERT_FILE` / `SSL_CERT_DIR` as seen by this process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub cert_file: Option<PathBuf>,
    pub cert_dirs: Vec<PathBuf>,
}

impl EnvOverrides {
    pub const CERT_FILE: &'static str = "SSL_CERT_FILE";
    pub const CERT_DIR: &'static str = "SSL_CERT_DIR";

    /// Read the variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var_os(Self::CERT_FILE),
            std::env::var_os(Self::CERT_DIR),
        )
    }

    /// Build from raw variable values. Empty values are ignored;
    /// `SSL_CERT_DIR` uses the platform path-list separator.
    pub fn from_vars(cert_file: Option<OsString>, cert_dir: Option<OsString>) -> Self {
        let cert_file = cert_file.filter(|v| !v.is_empty()).map(PathBuf::from);
        let cert_dirs = cert_dir
            .map(|v| {
                std::env::split_paths(&v)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            cert_file,
            cert_dirs,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cert_file.is_none() && self.cert_dirs.is_empty()
    }

    /// Every named location, required.
    #[must_use]
    pub fn sources(&self) -> Vec<StoreSource> {
        self.cert_file
            .iter()
            .chain(&self.cert_dirs)
            .map(|p| StoreSource::required(p.clone()))
            .collect()
    }
}

/// Choose the backends for `platform` under `config`.
///
/// Environment overrides, when honored and set, replace the platform
/// stores. Configured extra paths are always added as one more backend.
pub fn select_backends(
    platform: Platform,
    config: &DiscoveryConfig,
    env: &EnvOverrides,
) -> Vec<Backend> {
    let mut backends = Vec::new();
    let mut native_read = false;

    if config.honor_env && !env.is_empty() {
        info!(
            cert_file = ?env.cert_file,
            cert_dirs = ?env.cert_dirs,
            "using certificate locations from the environment"
        );
        backends.push(Backend::Directory(DirectoryReader::new(
            "environment",
            env.sources(),
        )));
    } else if config.include_defaults {
        if let Some(backend) = native_backend(platform, config) {
            backends.push(backend);
            native_read = true;
        }
    }

    // The full Windows backend already reads the extra stores.
    let stores_pending = !config.extra_stores.is_empty()
        && !(native_read && platform == Platform::Windows);
    if stores_pending {
        if let Some(backend) = extra_store_backend(platform, config) {
            backends.push(backend);
        }
    }

    if !config.extra_paths.is_empty() {
        backends.push(Backend::Directory(DirectoryReader::new(
            "configured",
            config
                .extra_paths
                .iter()
                .map(|p| StoreSource::required(p.clone()))
                .collect(),
        )));
    }

    debug!(
        platform = %platform,
        backends = ?backends.iter().map(RawStoreReader::name).collect::<Vec<_>>(),
        "selected backends"
    );
    backends
}

#[cfg_attr(not(windows), allow(unused_variables))]
fn native_backend(platform: Platform, config: &DiscoveryConfig) -> Option<Backend> {
    match platform {
        p if p.uses_directory_store() => {
            Some(Backend::Directory(DirectoryReader::system_defaults()))
        }
        #[cfg(windows)]
        Platform::Windows => Some(Backend::Windows(WindowsReader::new(
            config.extra_stores.clone(),
        ))),
        #[cfg(target_os = "macos")]
        Platform::MacOs => Some(Backend::Keychain(KeychainReader::new())),
        #[cfg(target_os = "android")]
        Platform::Android => Some(Backend::Android(AndroidReader::new())),
        Platform::Ios => {
            debug!("no enumerable system trust store on ios");
            None
        }
        other => {
            warn!(platform = %other, "native trust store not supported by this build");
            None
        }
    }
}

fn extra_store_backend(platform: Platform, config: &DiscoveryConfig) -> Option<Backend> {
    match platform {
        #[cfg(windows)]
        Platform::Windows => Some(Backend::Windows(WindowsReader::only(
            config.extra_stores.clone(),
        ))),
        other => {
            warn!(
                platform = %other,
                stores = ?config.extra_stores,
                "named system stores are only read on windows, ignoring"
            );
            None
        }
    }
}
